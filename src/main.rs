//! Backbeat demo player.
//!
//! Plays a built-in rock beat through the engine, optionally layering the
//! metronome, taking external MIDI input with through-playback, and printing
//! a practice report on exit.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

use clap::Parser;

use backbeat::engine::{ClickRate, DrumEngine, EngineEvent};
use backbeat::groove::{Division, DrumVoice, GrooveData, TimeSignature};
use backbeat::midi::{Kit, MidiInput, MidiPipeline};
use backbeat::practice::PerformanceTracker;
use backbeat::synth::VoiceOutput;

#[derive(Parser)]
#[command(name = "backbeat", about = "drum-groove playback and practice engine")]
struct Args {
    /// Tempo in BPM (30-300)
    #[arg(long, default_value_t = 120)]
    tempo: u16,

    /// Swing amount, 0-100
    #[arg(long, default_value_t = 0)]
    swing: u8,

    /// Metronome clicks: off, 4, 8, or 16
    #[arg(long, default_value = "off")]
    metronome: String,

    /// One measure of count-in clicks before the groove
    #[arg(long, default_value_t = false)]
    count_in: bool,

    /// Take MIDI input and play it through the synthesizer
    #[arg(long, default_value_t = false)]
    midi: bool,

    /// MIDI device name filter (substring match)
    #[arg(long)]
    device: Option<String>,

    /// Kit mapping for MIDI input
    #[arg(long, default_value = "td17")]
    kit: String,

    /// List MIDI input devices and exit
    #[arg(long, default_value_t = false)]
    list_midi: bool,

    /// How long to play, in seconds
    #[arg(long, default_value_t = 8.0)]
    seconds: f64,
}

/// One measure of a rock beat: hats on eighths, snare on 2 and 4, kick on
/// 1 and 3.
fn demo_groove(tempo: u16, swing: u8) -> GrooveData {
    let mut groove = GrooveData::new(TimeSignature::COMMON, Division::Sixteenths, tempo);
    groove.swing = swing;
    groove.title = Some("demo rock beat".to_string());

    let mut hats = vec![false; 16];
    for i in (0..16).step_by(2) {
        hats[i] = true;
    }
    let mut snare = vec![false; 16];
    snare[4] = true;
    snare[12] = true;
    let mut kick = vec![false; 16];
    kick[0] = true;
    kick[8] = true;

    groove.measures[0].set_row(DrumVoice::HiHatClosed, hats);
    groove.measures[0].set_row(DrumVoice::Snare, snare);
    groove.measures[0].set_row(DrumVoice::Kick, kick);
    groove
}

fn main() {
    let args = Args::parse();

    if args.list_midi {
        let devices = MidiInput::list_devices();
        if devices.is_empty() {
            println!("no MIDI input devices");
        }
        for name in devices {
            println!("{name}");
        }
        return;
    }

    let mut engine = match DrumEngine::new() {
        Ok(engine) => engine,
        Err(e) => {
            eprintln!("failed to start audio: {e}");
            std::process::exit(1);
        }
    };

    match args.metronome.as_str() {
        "off" => {}
        "4" => engine.set_click_rate(ClickRate::Quarters),
        "8" => engine.set_click_rate(ClickRate::Eighths),
        "16" => engine.set_click_rate(ClickRate::Sixteenths),
        other => {
            eprintln!("unknown metronome rate '{other}' (use off, 4, 8, or 16)");
            std::process::exit(2);
        }
    }
    engine.set_count_in(args.count_in);

    engine.subscribe(|event| {
        if let EngineEvent::PositionChanged(Some(index)) = event {
            print!("\rposition: {index:>3}");
            use std::io::Write;
            let _ = std::io::stdout().flush();
        }
    });

    // MIDI input with through-playback and practice grading.
    let tracker = Arc::new(Mutex::new(PerformanceTracker::new()));
    let mut _midi_connection = None;
    if args.midi {
        let Some(kit) = Kit::builtin(&args.kit) else {
            eprintln!(
                "unknown kit '{}' (built-ins: {})",
                args.kit,
                Kit::builtin_names().join(", ")
            );
            std::process::exit(2);
        };
        let output: Arc<dyn VoiceOutput> = match backbeat::synth::CpalOutput::new() {
            Ok(out) => Arc::new(out),
            Err(e) => {
                eprintln!("failed to open MIDI through output: {e}");
                std::process::exit(1);
            }
        };
        let mut pipeline = MidiPipeline::with_output(kit, output);
        pipeline.set_through(true);

        let grader = Arc::clone(&tracker);
        pipeline.subscribe(move |hit| {
            if let Ok(mut tracker) = grader.lock() {
                if let Some(analysis) = tracker.analyze_hit(hit.voice, hit.timestamp_ms) {
                    println!(
                        "\r{:<18} {:>5.1}  {}",
                        hit.voice.label(),
                        analysis.overall,
                        analysis.feedback.label()
                    );
                }
            }
        });

        let pipeline = Arc::new(Mutex::new(pipeline));
        match MidiInput::start(args.device.as_deref(), Arc::clone(&pipeline)) {
            Ok(connection) => {
                println!("MIDI input: {}", connection.port_name());
                _midi_connection = Some(connection);
            }
            Err(e) => {
                eprintln!("MIDI unavailable: {e}");
            }
        }
    }

    let groove = demo_groove(args.tempo, args.swing);
    if let Err(e) = groove.validate() {
        eprintln!("invalid groove: {e}");
        std::process::exit(2);
    }

    println!(
        "backbeat v{} — {} BPM, swing {}",
        env!("CARGO_PKG_VERSION"),
        args.tempo,
        args.swing
    );

    if args.midi {
        tracker
            .lock()
            .expect("tracker poisoned")
            .enable(Some(groove.clone()), args.tempo, 0.0);
    }

    if !engine.play(groove, true) {
        eprintln!("playback could not start");
        std::process::exit(1);
    }

    let stop_flag = Arc::new(AtomicBool::new(false));
    let handler_flag = Arc::clone(&stop_flag);
    if let Err(e) = ctrlc::set_handler(move || handler_flag.store(true, Ordering::SeqCst)) {
        eprintln!("ctrl-c handler: {e}");
    }

    let started = std::time::Instant::now();
    while !stop_flag.load(Ordering::SeqCst) && started.elapsed().as_secs_f64() < args.seconds {
        thread::sleep(Duration::from_millis(50));
    }

    engine.stop();
    engine.dispose();
    println!();

    if args.midi {
        print!("{}", tracker.lock().expect("tracker poisoned").report());
    }
    println!("done.");
}
