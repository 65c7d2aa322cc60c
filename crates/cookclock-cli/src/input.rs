//! Parsing of interactive session commands.

use chrono::{DateTime, Duration, Local, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Utc};
use cookclock_core::TaskId;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Start a predefined task by name.
    Start(String),
    Custom {
        name: String,
        secs: i64,
    },
    Schedule {
        name: String,
        secs: i64,
        at: DateTime<Utc>,
    },
    Pause(TaskId),
    Resume(TaskId),
    Clear(TaskId),
    ClearDone,
    List,
    Presets,
    Help,
    Quit,
}

pub const HELP: &str = "\
commands:
  start <preset>                     start a predefined task
  custom <name> <duration>           start a custom task now
  schedule <name> <duration> <when>  start a custom task later
  pause <id> | resume <id>           freeze or continue a countdown
  clear <id> | clear done            remove tasks
  list | presets | help | quit
durations: 90, 1:30, 90s, 25m, 1m30s
when:      HH:MM, YYYY-MM-DD HH:MM, +<duration>";

/// Parse one input line. Blank lines yield `Ok(None)`.
pub fn parse_command(line: &str, now: DateTime<Local>) -> Result<Option<Command>, String> {
    let mut words = line.split_whitespace();
    let Some(verb) = words.next() else {
        return Ok(None);
    };
    let rest: Vec<&str> = words.collect();

    let command = match verb.to_ascii_lowercase().as_str() {
        "start" => {
            if rest.is_empty() {
                return Err("usage: start <preset>".into());
            }
            Command::Start(rest.join(" "))
        }
        "custom" => {
            let (duration, name) = rest
                .split_last()
                .ok_or("usage: custom <name> <duration>")?;
            Command::Custom {
                name: name.join(" "),
                secs: parse_duration(duration)?,
            }
        }
        "schedule" => parse_schedule(&rest, now)?,
        "pause" => Command::Pause(parse_id(&rest)?),
        "resume" => Command::Resume(parse_id(&rest)?),
        "clear" => match rest.as_slice() {
            ["done"] => Command::ClearDone,
            _ => Command::Clear(parse_id(&rest)?),
        },
        "list" | "ls" => Command::List,
        "presets" => Command::Presets,
        "help" | "?" => Command::Help,
        "quit" | "exit" | "q" => Command::Quit,
        other => return Err(format!("unknown command '{other}' (try 'help')")),
    };
    Ok(Some(command))
}

fn parse_schedule(rest: &[&str], now: DateTime<Local>) -> Result<Command, String> {
    const USAGE: &str = "usage: schedule <name> <duration> <when>";

    // `YYYY-MM-DD HH:MM` spans two words; everything else is one.
    let (at, consumed) = match rest {
        [.., date, time] if NaiveDate::parse_from_str(date, "%Y-%m-%d").is_ok() => {
            (parse_start(&format!("{date} {time}"), now)?, 2)
        }
        [.., when] => (parse_start(when, now)?, 1),
        [] => return Err(USAGE.into()),
    };
    let head = &rest[..rest.len() - consumed];
    let (duration, name) = head.split_last().ok_or(USAGE)?;
    Ok(Command::Schedule {
        name: name.join(" "),
        secs: parse_duration(duration)?,
        at,
    })
}

fn parse_id(rest: &[&str]) -> Result<TaskId, String> {
    match rest {
        [id] => id.parse().map_err(|_| format!("not a task id: '{id}'")),
        _ => Err("expected a single task id".into()),
    }
}

/// Parse `90`, `1:30`, `90s`, `25m` or `1m30s` into seconds.
///
/// A leading minus is kept so that the engine can reject it.
pub fn parse_duration(input: &str) -> Result<i64, String> {
    let bad = || format!("not a duration: '{input}'");
    let s = input.trim();
    let (sign, body) = match s.strip_prefix('-') {
        Some(body) => (-1, body),
        None => (1, s),
    };
    if body.is_empty() {
        return Err(bad());
    }

    let secs = if let Some((m, sec)) = body.split_once(':') {
        let m: i64 = m.parse().map_err(|_| bad())?;
        let sec: i64 = sec.parse().map_err(|_| bad())?;
        if sec >= 60 {
            return Err(bad());
        }
        m.checked_mul(60)
            .and_then(|s| s.checked_add(sec))
            .ok_or_else(bad)?
    } else if body.chars().all(|c| c.is_ascii_digit()) {
        body.parse().map_err(|_| bad())?
    } else {
        let mut total = 0i64;
        let mut digits = String::new();
        for c in body.chars() {
            match c {
                '0'..='9' => digits.push(c),
                'h' | 'm' | 's' => {
                    let n: i64 = digits.parse().map_err(|_| bad())?;
                    digits.clear();
                    let unit = match c {
                        'h' => 3600,
                        'm' => 60,
                        _ => 1,
                    };
                    total = n
                        .checked_mul(unit)
                        .and_then(|part| total.checked_add(part))
                        .ok_or_else(bad)?;
                }
                _ => return Err(bad()),
            }
        }
        if !digits.is_empty() {
            return Err(bad());
        }
        total
    };
    Ok(sign * secs)
}

/// Parse a start time: `HH:MM` today, `YYYY-MM-DD HH:MM`, or `+<duration>`.
pub fn parse_start(input: &str, now: DateTime<Local>) -> Result<DateTime<Utc>, String> {
    let s = input.trim();
    if let Some(offset) = s.strip_prefix('+') {
        let secs = parse_duration(offset)?;
        return Duration::try_seconds(secs)
            .and_then(|offset| now.checked_add_signed(offset))
            .map(|at| at.with_timezone(&Utc))
            .ok_or_else(|| format!("not a start time: '{input}'"));
    }

    let naive = if let Ok(dt) = NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M") {
        dt
    } else if let Ok(t) = NaiveTime::parse_from_str(s, "%H:%M") {
        now.date_naive().and_time(t)
    } else {
        return Err(format!("not a start time: '{input}'"));
    };

    Local
        .from_local_datetime(&naive)
        .earliest()
        .map(|dt| dt.with_timezone(&Utc))
        .ok_or_else(|| format!("'{input}' does not exist in the local time zone"))
}
