//! Event Logger
//!
//! Append-only JSONL event logging, an in-memory queue, and the numbering
//! stream the simulation writes through.

use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::Path;

use herd_events::{generate_event_id, Event, EventPayload};

/// Destination for structured simulation events
pub trait EventRecorder {
    fn record(&mut self, event: &Event) -> std::io::Result<()>;

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

/// Logs events to a JSONL file
pub struct EventLogger {
    writer: Option<BufWriter<File>>,
    event_count: u64,
}

impl EventLogger {
    /// Create a new event logger writing to the specified path
    pub fn new(path: impl AsRef<Path>) -> std::io::Result<Self> {
        let file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open(path)?;

        Ok(Self {
            writer: Some(BufWriter::new(file)),
            event_count: 0,
        })
    }

    /// Create a logger that discards events
    pub fn null() -> Self {
        Self {
            writer: None,
            event_count: 0,
        }
    }

    /// Get the current event count
    pub fn event_count(&self) -> u64 {
        self.event_count
    }
}

impl EventRecorder for EventLogger {
    fn record(&mut self, event: &Event) -> std::io::Result<()> {
        self.event_count += 1;
        if let Some(ref mut writer) = self.writer {
            let json = event.to_jsonl()?;
            writeln!(writer, "{}", json)?;
        }
        Ok(())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        if let Some(ref mut writer) = self.writer {
            writer.flush()?;
        }
        Ok(())
    }
}

impl Drop for EventLogger {
    fn drop(&mut self) {
        if let Err(e) = EventRecorder::flush(self) {
            tracing::warn!("Failed to flush event logger: {}", e);
        }
    }
}

/// Events kept in memory
#[derive(Debug, Default)]
pub struct PendingEvents {
    events: Vec<Event>,
}

impl PendingEvents {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> &[Event] {
        &self.events
    }

    pub fn drain(&mut self) -> Vec<Event> {
        std::mem::take(&mut self.events)
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }
}

impl EventRecorder for PendingEvents {
    fn record(&mut self, event: &Event) -> std::io::Result<()> {
        self.events.push(event.clone());
        Ok(())
    }
}

impl<R: EventRecorder + ?Sized> EventRecorder for &mut R {
    fn record(&mut self, event: &Event) -> std::io::Result<()> {
        (**self).record(event)
    }

    fn flush(&mut self) -> std::io::Result<()> {
        (**self).flush()
    }
}

/// Assigns sequential event ids and forwards events to a recorder
pub struct EventStream<L> {
    recorder: L,
    next_event_id: u64,
}

impl<L: EventRecorder> EventStream<L> {
    pub fn new(recorder: L) -> Self {
        Self {
            recorder,
            next_event_id: 1,
        }
    }

    /// Number and record one event
    pub fn emit(&mut self, step: u64, payload: EventPayload) -> std::io::Result<()> {
        let event = Event::new(generate_event_id(self.next_event_id), step, payload);
        self.next_event_id += 1;
        self.recorder.record(&event)
    }

    pub fn flush(&mut self) -> std::io::Result<()> {
        self.recorder.flush()
    }

    pub fn recorder(&self) -> &L {
        &self.recorder
    }

    pub fn into_recorder(self) -> L {
        self.recorder
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use herd_events::{EventType, SurvivalRecord};
    use std::io::BufRead;

    fn survival(person_id: usize, died: bool) -> EventPayload {
        EventPayload::SurvivalCheck(SurvivalRecord { person_id, died })
    }

    #[test]
    fn test_event_logging() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("events.jsonl");

        let mut logger = EventLogger::new(&path).unwrap();
        let event = Event::new("evt_00000001", 2, survival(5, true));
        logger.record(&event).unwrap();
        EventRecorder::flush(&mut logger).unwrap();

        let file = File::open(&path).unwrap();
        let reader = std::io::BufReader::new(file);
        let lines: Vec<String> = reader.lines().map(|l| l.unwrap()).collect();
        assert_eq!(lines.len(), 1);

        let parsed = Event::from_jsonl(&lines[0]).unwrap();
        assert_eq!(parsed, event);
    }

    #[test]
    fn test_logger_flushes_on_drop() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("events.jsonl");

        {
            let mut stream = EventStream::new(EventLogger::new(&path).unwrap());
            stream.emit(1, survival(0, false)).unwrap();
            stream.emit(1, survival(1, true)).unwrap();
        }

        let content = std::fs::read_to_string(&path).unwrap();
        assert_eq!(content.lines().count(), 2);
    }

    #[test]
    fn test_null_logger() {
        let mut logger = EventLogger::null();
        let event = Event::new("evt_1", 1, survival(0, false));

        logger.record(&event).unwrap();
        assert_eq!(logger.event_count(), 1);
    }

    #[test]
    fn test_stream_numbers_events() {
        let mut stream = EventStream::new(PendingEvents::new());
        stream.emit(0, survival(0, false)).unwrap();
        stream.emit(1, survival(1, false)).unwrap();
        stream.emit(1, survival(2, true)).unwrap();

        let ids: Vec<&str> = stream
            .recorder()
            .events()
            .iter()
            .map(|e| e.event_id.as_str())
            .collect();
        assert_eq!(ids, ["evt_00000001", "evt_00000002", "evt_00000003"]);
        assert!(stream
            .recorder()
            .events()
            .iter()
            .all(|e| e.event_type() == EventType::SurvivalCheck));
    }

    #[test]
    fn test_pending_events() {
        let mut pending = PendingEvents::new();
        assert!(pending.is_empty());

        pending.record(&Event::new("evt_1", 1, survival(0, true))).unwrap();
        assert_eq!(pending.len(), 1);

        let drained = pending.drain();
        assert_eq!(drained.len(), 1);
        assert!(pending.is_empty());
    }

    #[test]
    fn test_recorder_by_reference() {
        let mut pending = PendingEvents::new();
        {
            let mut stream = EventStream::new(&mut pending);
            stream.emit(3, survival(4, false)).unwrap();
        }
        assert_eq!(pending.len(), 1);
        assert_eq!(pending.events()[0].step, 3);
    }
}
