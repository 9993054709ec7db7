use std::fs::File;
use std::io::{self, Write};
use std::path::Path;

/// Writes every log line to stderr and, when it could be opened, to the log
/// file as well.
struct Tee {
    file: Option<File>,
}

impl Write for Tee {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        io::stderr().write_all(buf)?;
        if let Some(file) = &mut self.file {
            // A full disk should not take the console output down with it.
            if file.write_all(buf).is_err() {
                self.file = None;
            }
        }
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        io::stderr().flush()?;
        if let Some(file) = &mut self.file {
            file.flush()?;
        }
        Ok(())
    }
}

/// Install the global logger. `RUST_LOG` overrides the default `info` filter.
///
/// The log file is truncated on every start.
pub fn init(log_file: Option<&Path>) {
    let file = log_file.and_then(|path| File::create(path).ok());
    let has_file = file.is_some();

    let result = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format(|buf, record| {
            writeln!(
                buf,
                "{} [{}] {}",
                buf.timestamp(),
                record.level(),
                record.args()
            )
        })
        .target(env_logger::Target::Pipe(Box::new(Tee { file })))
        .try_init();

    if result.is_ok() && !has_file {
        if let Some(path) = log_file {
            log::warn!("Could not open log file {}", path.display());
        }
    }
}
