//! Line-oriented control input: recognized speech and a few console commands.
//!
//! Plain lines are treated as speech recognition results. Lines starting
//! with `:` are commands:
//!
//! - `:server <url>` saves a new server address
//! - `:voice-test` speaks the voice test phrase
//! - `:quit` stops the pipeline

use std::io::BufRead;

use machinevisor::PipelineHandle;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ControlLine {
    Utterance(String),
    SaveServer(String),
    VoiceTest,
    Quit,
    Unknown(String),
}

pub fn parse_line(line: &str) -> Option<ControlLine> {
    let trimmed = line.trim();
    if trimmed.is_empty() {
        return None;
    }
    let Some(command) = trimmed.strip_prefix(':') else {
        return Some(ControlLine::Utterance(trimmed.to_string()));
    };

    let (name, arg) = command
        .split_once(char::is_whitespace)
        .map(|(n, a)| (n, a.trim()))
        .unwrap_or((command, ""));
    Some(match name {
        "server" => ControlLine::SaveServer(arg.to_string()),
        "voice-test" => ControlLine::VoiceTest,
        "quit" | "exit" => ControlLine::Quit,
        _ => ControlLine::Unknown(name.to_string()),
    })
}

/// Forward every line of `reader` to the pipeline. Returns the number of
/// lines delivered once input ends, `:quit` is read, or the pipeline stops.
pub fn forward_lines(reader: impl BufRead, handle: &PipelineHandle) -> std::io::Result<usize> {
    let mut delivered = 0;
    for line in reader.lines() {
        let line = line?;
        let accepted = match parse_line(&line) {
            None => continue,
            Some(ControlLine::Utterance(text)) => handle.utterance(text),
            Some(ControlLine::SaveServer(url)) => handle.save_server_url(url),
            Some(ControlLine::VoiceTest) => handle.speak_test_phrase(),
            Some(ControlLine::Quit) => {
                handle.shutdown();
                return Ok(delivered);
            }
            Some(ControlLine::Unknown(name)) => {
                eprintln!("Unknown command :{name} (try :server, :voice-test, :quit)");
                continue;
            }
        };
        if !accepted {
            break;
        }
        delivered += 1;
    }
    Ok(delivered)
}

/// Read stdin on a plain thread; blocking reads must not hold up runtime
/// shutdown.
pub fn spawn_stdin_reader(handle: PipelineHandle) -> std::io::Result<std::thread::JoinHandle<()>> {
    std::thread::Builder::new()
        .name("machinevisor-stdin".to_string())
        .spawn(move || {
            let stdin = std::io::stdin();
            match forward_lines(stdin.lock(), &handle) {
                Ok(n) => tracing::debug!("stdin closed after {n} lines"),
                Err(e) => tracing::warn!("stdin read error: {e}"),
            }
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_lines() {
        assert_eq!(parse_line("   "), None);
        assert_eq!(
            parse_line("  давай посмотреть "),
            Some(ControlLine::Utterance("давай посмотреть".into()))
        );
        assert_eq!(
            parse_line(":server  192.168.1.5:8000 "),
            Some(ControlLine::SaveServer("192.168.1.5:8000".into()))
        );
        assert_eq!(parse_line(":voice-test"), Some(ControlLine::VoiceTest));
        assert_eq!(parse_line(":quit"), Some(ControlLine::Quit));
        assert_eq!(parse_line(":nope x"), Some(ControlLine::Unknown("nope".into())));
    }
}
