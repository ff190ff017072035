use badge_tracker::client::HttpSource;
use badge_tracker::config::Config;
use badge_tracker::dashboard::Dashboard;
use badge_tracker::input::spawn_line_reader;
use badge_tracker::render::render;
use badge_tracker::{init_logger, poll};
use clap::Parser;
use dotenv::dotenv;
use log::{error, info};
use std::error::Error;
use std::io::{self, BufReader, Write};
use std::process::ExitCode;
use tokio::{select, signal};

/// Live view of participant badge progress. Type a name and press
/// enter to search, an empty line clears the search
#[derive(Parser, Debug)]
#[command(name = "badge-dashboard")]
struct Args {
    /// Progress service base URL, overrides DASHBOARD_API_URL
    #[arg(long)]
    api_url: Option<String>,
    /// Initial search query
    #[arg(long, default_value = "")]
    search: String,
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();

    let using_env_file = dotenv().is_ok();
    init_logger();
    if using_env_file {
        info!("using .env file");
    }

    match run(args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!("{err}");
            ExitCode::FAILURE
        }
    }
}

async fn run(args: Args) -> Result<(), Box<dyn Error>> {
    let mut config = Config::from_env()?;
    if let Some(api_url) = args.api_url {
        config.api_url = api_url;
    }

    let source = HttpSource::new(&config)?;
    info!("polling {} every {:?}", source.url(), config.poll_interval);

    let handle = poll::start(source, config.poll_interval);
    let mut updates = handle.subscribe();

    let mut dashboard = Dashboard::new();
    dashboard.set_query(&args.search);
    redraw(&dashboard);

    let mut lines = spawn_line_reader(BufReader::new(io::stdin()));
    let mut stdin_open = true;

    loop {
        select! {
            changed = updates.changed() => {
                if changed.is_err() {
                    break;
                }
                let feed = updates.borrow().clone();
                dashboard.update(feed);
                redraw(&dashboard);
            }
            line = lines.recv(), if stdin_open => {
                match line {
                    Some(query) => {
                        dashboard.set_query(query.trim());
                        redraw(&dashboard);
                    }
                    None => stdin_open = false,
                }
            }
            _ = signal::ctrl_c() => break,
        }
    }

    handle.shutdown().await;
    Ok(())
}

fn redraw(dashboard: &Dashboard) {
    let mut stdout = io::stdout().lock();
    if let Err(err) = draw(&mut stdout, dashboard) {
        error!("unable to draw dashboard: {err}");
    }
}

/// Clears the terminal, writes the frame and leaves the cursor on
/// the search prompt
fn draw(out: &mut impl Write, dashboard: &Dashboard) -> io::Result<()> {
    write!(out, "\x1B[2J\x1B[H{}\nsearch> ", render(dashboard))?;
    out.flush()
}

#[cfg(test)]
mod test {
    use super::draw;
    use badge_tracker::dashboard::Dashboard;

    #[test]
    fn prompt_stays_on_last_line() {
        let mut dashboard = Dashboard::new();
        dashboard.set_query("ana");

        let mut out: Vec<u8> = Vec::new();
        draw(&mut out, &dashboard).unwrap();
        let frame = String::from_utf8(out).unwrap();
        assert!(frame.starts_with("\x1B[2J\x1B[H"));
        assert!(frame.contains("Search: ana"));
        assert!(frame.ends_with("\nsearch> "));
    }
}
