//! Performance tracking — grading played hits against the loaded groove.
//!
//! The tracker consumes [`VoiceHit`](crate::midi::VoiceHit)-style events
//! (a voice plus a millisecond timestamp) and scores each against the
//! nearest expected beat and against the groove's voice map. Scores
//! accumulate into running statistics readable at any time.

use crate::groove::{DrumVoice, GrooveData};

/// Threshold above which a hit counts as accurate overall.
const ACCURATE_THRESHOLD: f64 = 70.0;

/// Qualitative feedback for one hit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Feedback {
    Perfect,
    Great,
    Good,
    KeepTrying,
    Miss,
}

impl Feedback {
    /// The label shown to the player.
    pub fn label(self) -> &'static str {
        match self {
            Feedback::Perfect => "Perfect!",
            Feedback::Great => "Great!",
            Feedback::Good => "Good",
            Feedback::KeepTrying => "Keep trying",
            Feedback::Miss => "Miss",
        }
    }

    fn for_score(score: f64) -> Self {
        if score >= 90.0 {
            Feedback::Perfect
        } else if score >= 75.0 {
            Feedback::Great
        } else if score >= 60.0 {
            Feedback::Good
        } else if score >= 40.0 {
            Feedback::KeepTrying
        } else {
            Feedback::Miss
        }
    }
}

/// Scores for one analyzed hit.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HitAnalysis {
    /// 0–100; 100 dead on the beat, 0 at or beyond a quarter beat off.
    pub timing_accuracy: f64,
    /// 80 if the voice appears in the groove, 30 if not, 50 if no groove
    /// is loaded to check against.
    pub note_accuracy: f64,
    /// Arithmetic mean of the two.
    pub overall: f64,
    pub feedback: Feedback,
}

/// Aggregated statistics for a practice run.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PerformanceStats {
    pub total_hits: u32,
    pub accurate_hits: u32,
    /// Absolute timing error of each hit, milliseconds.
    pub timing_errors_ms: Vec<f64>,
    /// Incrementally maintained mean of the overall scores.
    pub average_score: f64,
}

impl PerformanceStats {
    /// Share of hits that scored accurate, 0–100.
    pub fn accuracy_pct(&self) -> f64 {
        if self.total_hits == 0 {
            0.0
        } else {
            self.accurate_hits as f64 / self.total_hits as f64 * 100.0
        }
    }

    /// Mean absolute timing error in milliseconds.
    pub fn average_timing_error_ms(&self) -> f64 {
        if self.timing_errors_ms.is_empty() {
            0.0
        } else {
            self.timing_errors_ms.iter().sum::<f64>() / self.timing_errors_ms.len() as f64
        }
    }
}

/// Grades hits against a reference groove and tempo.
pub struct PerformanceTracker {
    enabled: bool,
    groove: Option<GrooveData>,
    tempo: u16,
    start_ms: f64,
    stats: PerformanceStats,
}

impl PerformanceTracker {
    /// A disabled tracker with empty statistics.
    pub fn new() -> Self {
        Self {
            enabled: false,
            groove: None,
            tempo: 120,
            start_ms: 0.0,
            stats: PerformanceStats::default(),
        }
    }

    /// Start a run: replace the reference state and zero the statistics.
    /// `groove` may be `None` when there is nothing to verify notes against.
    pub fn enable(&mut self, groove: Option<GrooveData>, tempo: u16, start_ms: f64) {
        self.enabled = true;
        self.groove = groove;
        self.tempo = tempo;
        self.start_ms = start_ms;
        self.stats = PerformanceStats::default();
    }

    /// Stop accepting hits. Statistics stay readable until the next
    /// [`enable`](Self::enable).
    pub fn disable(&mut self) {
        self.enabled = false;
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Grade one hit. Returns `None` iff the tracker is disabled.
    pub fn analyze_hit(&mut self, voice: DrumVoice, timestamp_ms: f64) -> Option<HitAnalysis> {
        if !self.enabled {
            return None;
        }

        let beat_ms = 60_000.0 / self.tempo as f64;
        let elapsed = timestamp_ms - self.start_ms;
        let nearest_beat = (elapsed / beat_ms).round();
        let error_ms = (elapsed - nearest_beat * beat_ms).abs();
        // Zero tolerance beyond a quarter-beat window.
        let timing_accuracy = (100.0 - error_ms / (beat_ms / 4.0) * 100.0).max(0.0);

        let note_accuracy = match &self.groove {
            None => 50.0, // nothing loaded, cannot verify
            Some(groove) => {
                let present = groove.measures.iter().any(|measure| {
                    measure
                        .notes
                        .get(&voice)
                        .is_some_and(|row| row.iter().any(|&hit| hit))
                });
                if present {
                    80.0
                } else {
                    30.0
                }
            }
        };

        let overall = (timing_accuracy + note_accuracy) / 2.0;
        let analysis = HitAnalysis {
            timing_accuracy,
            note_accuracy,
            overall,
            feedback: Feedback::for_score(overall),
        };

        self.stats.total_hits += 1;
        if overall > ACCURATE_THRESHOLD {
            self.stats.accurate_hits += 1;
        }
        self.stats.timing_errors_ms.push(error_ms);
        let n = self.stats.total_hits as f64;
        self.stats.average_score = (self.stats.average_score * (n - 1.0) + overall) / n;

        Some(analysis)
    }

    /// Current run statistics.
    pub fn stats(&self) -> &PerformanceStats {
        &self.stats
    }

    /// Plain-text summary of the run.
    pub fn report(&self) -> String {
        let stats = &self.stats;
        format!(
            "Practice report\n\
             ---------------\n\
             hits:            {}\n\
             accurate:        {} ({:.1}%)\n\
             average score:   {:.1}\n\
             avg timing err:  {:.1} ms\n",
            stats.total_hits,
            stats.accurate_hits,
            stats.accuracy_pct(),
            stats.average_score,
            stats.average_timing_error_ms(),
        )
    }
}

impl Default for PerformanceTracker {
    fn default() -> Self {
        Self::new()
    }
}
