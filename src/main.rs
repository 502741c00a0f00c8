use grouplog::config::Config;
use grouplog::log::{Entry, GroupedLog, Row};
use tracing_subscriber::EnvFilter;

const TIMES: [f64; 15] = [
    3.0, 3.0, 3.0, 4.0,
    6.5, 7.0, 7.0, 8.0, 9.0, 10.0,
    20.0, 20.0, 20.0, 20.0, 20.0,
];

fn print_rows(log: &GroupedLog) -> grouplog::Result<()> {
    println!("visible rows: {}", log.visible_count());
    for (i, row) in log.rows(0..log.visible_count())?.enumerate() {
        match row {
            Row::Group(group) => {
                let marker = if group.is_expanded { "v" } else { ">" };
                println!("{:>3} {} group {} ({} entries)", i, marker, group.name, group.entry_count);
            }
            Row::Entry(entry) => println!("{:>3}     {} ({}s)", i, entry.content, entry.time),
        }
    }
    println!();
    return Ok(());
}

fn main() -> grouplog::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let mut log = GroupedLog::new(Config::default());
    log.append(
        TIMES
            .iter()
            .enumerate()
            .map(|(i, &time)| Entry::new(format!("entry {}", i + 1), time)),
    )?;
    print_rows(&log)?;

    log.expand(0)?;
    log.expand(2)?;
    print_rows(&log)?;

    log.fold(0)?;
    log.append([20.0, 21.0, 22.0, 24.0, 26.0]
        .into_iter()
        .enumerate()
        .map(|(i, time)| Entry::new(format!("entry {}", i + 16), time)))?;
    print_rows(&log)?;

    return Ok(());
}
