/*!
Replay telemetry source.

Plays back a JSON Lines recording, one object per tick:

```text
{"PLANE_LATITUDE": 40.78, "PLANE_LONGITUDE": -73.88, "PLANE_ALTITUDE": 1000.0, ...}
```

Variable names resolve against the keys of the first record. The link goes
down when the recording runs out.
*/

use crate::error::{BridgeError, Result};
use crate::source::{SourceError, TelemetrySource, VariableHandle};
use serde_json::{Map, Value};
use std::fs::File;
use std::io::{BufRead, BufReader, Lines};
use std::path::Path;
use tracing::{info, warn};

type Record = Map<String, Value>;

/// Plays back recorded telemetry from any line-oriented reader
pub struct ReplaySource<R: BufRead = BufReader<File>> {
    lines: Lines<R>,
    names: Vec<String>,
    current: Option<Record>,
    /// The first record was read at connect time and not yet consumed by a tick
    primed: bool,
    line_number: usize,
    live: bool,
}

impl ReplaySource<BufReader<File>> {
    /// Open a recording file
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = File::open(path.as_ref()).map_err(|e| {
            BridgeError::connection(format!("cannot open replay file {}: {}", path.as_ref().display(), e))
        })?;
        info!("📼 Replaying telemetry from {}", path.as_ref().display());
        Self::connect(BufReader::new(file))
    }
}

impl<R: BufRead> ReplaySource<R> {
    /// Start a replay. The first record must parse; it defines the
    /// variables that can be resolved.
    pub fn connect(reader: R) -> Result<Self> {
        let mut lines = reader.lines();
        let mut line_number = 0;

        let first = loop {
            match lines.next() {
                Some(line) => {
                    line_number += 1;
                    let line = line?;
                    if line.trim().is_empty() {
                        continue;
                    }
                    break serde_json::from_str::<Record>(&line)?;
                }
                None => return Err(BridgeError::connection("replay recording is empty")),
            }
        };

        Ok(Self {
            lines,
            names: first.keys().cloned().collect(),
            current: Some(first),
            primed: true,
            line_number,
            live: true,
        })
    }

    /// Number of lines consumed so far
    pub fn line_number(&self) -> usize {
        self.line_number
    }

    fn next_record(&mut self) -> Option<Record> {
        loop {
            let line = match self.lines.next() {
                Some(Ok(line)) => line,
                Some(Err(e)) => {
                    warn!("📼 Replay read failed after line {}: {}", self.line_number, e);
                    self.live = false;
                    return None;
                }
                None => {
                    info!("📼 Replay finished after {} lines", self.line_number);
                    self.live = false;
                    return None;
                }
            };
            self.line_number += 1;

            if line.trim().is_empty() {
                continue;
            }

            return match serde_json::from_str::<Record>(&line) {
                Ok(record) => Some(record),
                Err(e) => {
                    // Keep going; every read this tick falls back
                    warn!("📼 Skipping malformed replay line {}: {}", self.line_number, e);
                    Some(Record::new())
                }
            };
        }
    }
}

impl<R: BufRead> TelemetrySource for ReplaySource<R> {
    fn resolve(&mut self, name: &str) -> std::result::Result<VariableHandle, SourceError> {
        self.names
            .iter()
            .position(|known| known == name)
            .map(VariableHandle)
            .ok_or_else(|| SourceError::NotFound(name.to_string()))
    }

    fn read(&mut self, handle: VariableHandle) -> std::result::Result<f64, SourceError> {
        if !self.live {
            return Err(SourceError::Disconnected);
        }

        let name = self.names.get(handle.0).ok_or(SourceError::Unavailable)?;
        self.current
            .as_ref()
            .and_then(|record| record.get(name))
            .and_then(Value::as_f64)
            .ok_or(SourceError::Unavailable)
    }

    fn is_live(&self) -> bool {
        self.live
    }

    fn disconnect(&mut self) {
        self.live = false;
        self.current = None;
    }

    fn advance(&mut self) {
        if self.primed {
            self.primed = false;
            return;
        }
        if self.live {
            self.current = self.next_record();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::simvars;
    use std::io::{Cursor, Write};
    use tempfile::NamedTempFile;

    fn replay(text: &str) -> ReplaySource<Cursor<Vec<u8>>> {
        ReplaySource::connect(Cursor::new(text.as_bytes().to_vec())).unwrap()
    }

    #[test]
    fn test_plays_records_in_order() {
        let mut source = replay(
            "{\"PLANE_LATITUDE\": 40.0}\n\n{\"PLANE_LATITUDE\": 41.0}\n",
        );
        let lat = source.resolve(simvars::PLANE_LATITUDE).unwrap();

        source.advance();
        assert_eq!(source.read(lat), Ok(40.0));
        assert!(source.is_live());

        source.advance();
        assert_eq!(source.read(lat), Ok(41.0));
        assert_eq!(source.line_number(), 3);

        source.advance();
        assert!(!source.is_live());
        assert_eq!(source.read(lat), Err(SourceError::Disconnected));
    }

    #[test]
    fn test_names_resolve_against_first_record() {
        let mut source = replay("{\"PLANE_LATITUDE\": 40.0}\n");
        assert!(source.resolve(simvars::PLANE_LATITUDE).is_ok());
        assert_eq!(
            source.resolve(simvars::PLANE_LONGITUDE),
            Err(SourceError::NotFound(simvars::PLANE_LONGITUDE.to_string()))
        );
    }

    #[test]
    fn test_missing_or_bad_values_are_unavailable() {
        let mut source = replay(concat!(
            "{\"PLANE_LATITUDE\": 40.0, \"PLANE_ALTITUDE\": 900}\n",
            "{\"PLANE_ALTITUDE\": \"high\"}\n",
            "not json\n",
        ));
        let lat = source.resolve(simvars::PLANE_LATITUDE).unwrap();
        let alt = source.resolve(simvars::PLANE_ALTITUDE).unwrap();

        source.advance();
        assert_eq!(source.read(alt), Ok(900.0));

        source.advance();
        assert_eq!(source.read(lat), Err(SourceError::Unavailable));
        assert_eq!(source.read(alt), Err(SourceError::Unavailable));

        source.advance();
        assert!(source.is_live());
        assert_eq!(source.read(lat), Err(SourceError::Unavailable));
    }

    #[test]
    fn test_empty_recording_fails_to_connect() {
        let result = ReplaySource::connect(Cursor::new(b"\n\n".to_vec()));
        assert!(matches!(result, Err(BridgeError::Connection(_))));
    }

    #[test]
    fn test_open_file() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "{{\"GROUND_VELOCITY\": 100.0}}").unwrap();

        let mut source = ReplaySource::open(file.path()).unwrap();
        let spd = source.resolve(simvars::GROUND_VELOCITY).unwrap();
        source.advance();
        assert_eq!(source.read(spd), Ok(100.0));
    }
}
