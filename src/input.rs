use log::error;
use std::io::BufRead;
use std::thread;
use tokio::sync::mpsc;

/// Reads lines from `reader` on a dedicated thread and forwards them
/// through a channel. Blocking reads stay off the async runtime so it
/// can shut down while the reader is still waiting for input. The
/// channel closes once the reader reaches its end or fails
pub fn spawn_line_reader<R>(reader: R) -> mpsc::UnboundedReceiver<String>
where
    R: BufRead + Send + 'static,
{
    let (tx, rx) = mpsc::unbounded_channel();
    let spawned = thread::Builder::new()
        .name("line-reader".to_string())
        .spawn(move || {
            for line in reader.lines() {
                match line {
                    Ok(line) => {
                        if tx.send(line).is_err() {
                            break;
                        }
                    }
                    Err(err) => {
                        error!("unable to read input: {err}");
                        break;
                    }
                }
            }
        });
    if let Err(err) = spawned {
        error!("unable to start input thread: {err}");
    }
    rx
}
