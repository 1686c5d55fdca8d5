// recording.rs

use log::*;

/// Samples captured between `start_record` and `end_record`, oldest first.
#[derive(Debug, Clone)]
pub struct RecordingBuffer {
    recording: bool,
    samples: Vec<f32>,
    limit: usize,
    overflow_logged: bool,
}

impl RecordingBuffer {
    pub fn new(limit: usize) -> Self {
        Self {
            recording: false,
            samples: Vec::new(),
            limit,
            overflow_logged: false,
        }
    }

    pub fn is_recording(&self) -> bool {
        self.recording
    }

    /// Clears old samples and begins a new recording, also when one is already running.
    pub fn start(&mut self) {
        self.samples.clear();
        self.overflow_logged = false;
        self.recording = true;
    }

    /// Freeze the samples. They stay readable until the next `start`.
    pub fn stop(&mut self) {
        self.recording = false;
    }

    /// Append while recording; otherwise the sample is not kept.
    pub fn push(&mut self, value: f32) {
        if !self.recording {
            return;
        }
        if self.samples.len() >= self.limit {
            if !self.overflow_logged {
                warn!("Recording full at {} samples, dropping new ones", self.limit);
                self.overflow_logged = true;
            }
            return;
        }
        self.samples.push(value);
    }

    pub fn samples(&self) -> &[f32] {
        &self.samples
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn idle_buffer_keeps_nothing() {
        let mut rec = RecordingBuffer::new(10);
        rec.push(20.0);
        assert!(rec.is_empty());
    }

    #[test]
    fn restart_clears_previous_samples() {
        let mut rec = RecordingBuffer::new(10);
        rec.start();
        rec.push(1.0);
        rec.push(2.0);
        rec.stop();
        rec.push(3.0);
        assert_eq!(rec.samples(), &[1.0, 2.0]);

        rec.start();
        assert!(rec.is_empty());
        assert!(rec.is_recording());
    }

    #[test]
    fn limit_caps_growth() {
        let mut rec = RecordingBuffer::new(2);
        rec.start();
        for v in [1.0, 2.0, 3.0, 4.0] {
            rec.push(v);
        }
        assert_eq!(rec.samples(), &[1.0, 2.0]);
    }
}

// EOF
