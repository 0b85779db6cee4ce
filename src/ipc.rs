use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::io::{BufRead, BufReader, Write};
use std::os::unix::net::{UnixListener, UnixStream};
use std::path::PathBuf;
use std::time::Duration;

use crate::presenter::Card;
use crate::zones::ZoneDescriptor;

#[derive(Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "cmd", rename_all = "kebab-case")]
pub enum IpcCommand {
    SetView { view: String },
    SetCompact { compact: bool },
    ToggleCompact,
    GetState,
    Quit,
}

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct IpcResponse {
    pub ok: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    // State fields (only for get-state)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub view: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub compact: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub height: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub config_path: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub zones: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cards: Option<Vec<CardInfo>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CardInfo {
    pub id: String,
    pub city: String,
    pub region: String,
    pub time: String,
    pub date: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub relative_day: Option<String>,
    pub ticks: u64,
}

impl CardInfo {
    pub fn new(zone: &ZoneDescriptor, card: &Card) -> Self {
        Self {
            id: zone.id.clone(),
            city: zone.city.clone(),
            region: zone.region.clone(),
            time: card.snapshot.time_string(),
            date: card.snapshot.date_label.clone(),
            relative_day: card.snapshot.relative_day.map(|d| d.as_str().to_string()),
            ticks: card.ticks,
        }
    }
}

/// Everything `get-state` reports besides `ok`.
pub struct StateReport {
    pub view: String,
    pub compact: bool,
    pub width: u32,
    pub height: u32,
    pub config_path: String,
    pub zones: Vec<String>,
    pub cards: Vec<CardInfo>,
}

impl IpcResponse {
    pub fn ok() -> Self {
        Self { ok: true, ..Self::default() }
    }

    pub fn err(msg: impl Into<String>) -> Self {
        Self { ok: false, error: Some(msg.into()), ..Self::default() }
    }

    pub fn state(report: StateReport) -> Self {
        Self {
            ok: true,
            view: Some(report.view),
            compact: Some(report.compact),
            width: Some(report.width),
            height: Some(report.height),
            config_path: Some(report.config_path),
            zones: Some(report.zones),
            cards: Some(report.cards),
            ..Self::default()
        }
    }
}

pub fn socket_path(override_path: Option<&PathBuf>) -> PathBuf {
    if let Some(p) = override_path {
        return p.clone();
    }
    if let Ok(dir) = std::env::var("XDG_RUNTIME_DIR") {
        PathBuf::from(dir).join("worldclock.sock")
    } else {
        let uid = unsafe { libc::getuid() };
        PathBuf::from(format!("/tmp/worldclock-{}.sock", uid))
    }
}

pub fn create_listener(path: &PathBuf) -> Result<UnixListener> {
    // Remove stale socket
    if path.exists() {
        if UnixStream::connect(path).is_ok() {
            anyhow::bail!("Another worldclock instance is already running (socket {} is active)", path.display());
        }
        std::fs::remove_file(path)?;
    }

    let listener = UnixListener::bind(path)?;
    listener.set_nonblocking(true)?;
    log::info!("IPC listening on {}", path.display());
    Ok(listener)
}

pub fn cleanup_socket(path: &PathBuf) {
    if path.exists() {
        let _ = std::fs::remove_file(path);
        log::info!("Removed socket {}", path.display());
    }
}

/// Longest a client may stall the event loop while sending or receiving.
pub const CLIENT_TIMEOUT: Duration = Duration::from_millis(500);

/// Accepted streams are blocking; bound every read and write on them.
pub fn set_client_timeouts(stream: &UnixStream) -> Result<()> {
    stream.set_read_timeout(Some(CLIENT_TIMEOUT))?;
    stream.set_write_timeout(Some(CLIENT_TIMEOUT))?;
    Ok(())
}

pub fn read_command(stream: &UnixStream) -> Result<IpcCommand> {
    let mut reader = BufReader::new(stream);
    let mut line = String::new();
    reader.read_line(&mut line)?;
    let cmd: IpcCommand = serde_json::from_str(line.trim())?;
    Ok(cmd)
}

pub fn write_response(stream: &mut UnixStream, response: &IpcResponse) -> Result<()> {
    let json = serde_json::to_string(response)?;
    stream.write_all(json.as_bytes())?;
    stream.write_all(b"\n")?;
    stream.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn commands_use_kebab_case_tags() {
        let cmd: IpcCommand = serde_json::from_value(json!({"cmd": "set-view", "view": "reno"})).unwrap();
        assert_eq!(cmd, IpcCommand::SetView { view: "reno".into() });
        let cmd: IpcCommand = serde_json::from_value(json!({"cmd": "toggle-compact"})).unwrap();
        assert_eq!(cmd, IpcCommand::ToggleCompact);
        assert!(serde_json::from_value::<IpcCommand>(json!({"cmd": "set-theme"})).is_err());
    }

    #[test]
    fn silent_client_times_out() {
        let path = std::env::temp_dir().join(format!("worldclock-test-{}.sock", std::process::id()));
        let listener = create_listener(&path).unwrap();
        let _client = UnixStream::connect(&path).unwrap();
        let (stream, _) = listener.accept().unwrap();
        set_client_timeouts(&stream).unwrap();

        let started = std::time::Instant::now();
        assert!(read_command(&stream).is_err());
        assert!(started.elapsed() < Duration::from_secs(2));
        cleanup_socket(&path);
    }

    #[test]
    fn plain_responses_omit_state_fields() {
        assert_eq!(serde_json::to_value(IpcResponse::ok()).unwrap(), json!({"ok": true}));
        assert_eq!(
            serde_json::to_value(IpcResponse::err("zone 'x' is not registered")).unwrap(),
            json!({"ok": false, "error": "zone 'x' is not registered"})
        );
    }

    #[test]
    fn state_response_lists_cards() {
        let resp = IpcResponse::state(StateReport {
            view: "all".into(),
            compact: false,
            width: 400,
            height: 300,
            config_path: "/tmp/config.toml".into(),
            zones: vec!["brisbane".into()],
            cards: vec![CardInfo {
                id: "brisbane".into(),
                city: "Brisbane".into(),
                region: "Queensland, Australia".into(),
                time: "06:00:00 AM".into(),
                date: "Tuesday, January 16, 2024".into(),
                relative_day: None,
                ticks: 3,
            }],
        });
        let value = serde_json::to_value(&resp).unwrap();
        assert_eq!(value["view"], "all");
        assert_eq!(value["cards"][0]["time"], "06:00:00 AM");
        assert!(value["cards"][0].get("relative_day").is_none());
        assert!(value.get("error").is_none());
    }

    #[test]
    fn socket_override_wins() {
        let path = PathBuf::from("/tmp/custom.sock");
        assert_eq!(socket_path(Some(&path)), path);
    }
}
