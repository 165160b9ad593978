use medico_room_core::MediaKind;

/// One line typed by the user.
#[derive(Debug, PartialEq, Eq)]
pub enum Input {
    Chat(String),
    Audio(bool),
    Video(bool),
    Share(bool),
    Devices,
    Device { kind: MediaKind, device_id: String },
    Who,
    Record,
    Help,
    Leave,
}

pub const HELP: &str = "\
/audio on|off       microphone
/video on|off       camera
/share | /unshare   screen share
/devices            list capture devices
/device audio|video <id>
/who                participants
/record             start or stop recording
/leave              leave the room
anything else is sent as chat";

pub fn parse(line: &str) -> Result<Option<Input>, String> {
    let line = line.trim();
    if line.is_empty() {
        return Ok(None);
    }
    let Some(command) = line.strip_prefix('/') else {
        return Ok(Some(Input::Chat(line.to_owned())));
    };

    let mut words = command.split_whitespace();
    let input = match (words.next(), words.next(), words.next()) {
        (Some("audio"), Some(arg), None) => Input::Audio(switch(arg)?),
        (Some("video"), Some(arg), None) => Input::Video(switch(arg)?),
        (Some("share"), None, None) => Input::Share(true),
        (Some("unshare"), None, None) => Input::Share(false),
        (Some("devices"), None, None) => Input::Devices,
        (Some("device"), Some(kind), Some(device_id)) => Input::Device {
            kind: media_kind(kind)?,
            device_id: device_id.to_owned(),
        },
        (Some("who"), None, None) => Input::Who,
        (Some("record"), None, None) => Input::Record,
        (Some("help"), None, None) => Input::Help,
        (Some("leave"), None, None) | (Some("quit"), None, None) => Input::Leave,
        _ => return Err(format!("Unknown command '{line}', try /help")),
    };
    Ok(Some(input))
}

fn switch(arg: &str) -> Result<bool, String> {
    match arg {
        "on" => Ok(true),
        "off" => Ok(false),
        other => Err(format!("Expected on or off, got '{other}'")),
    }
}

fn media_kind(arg: &str) -> Result<MediaKind, String> {
    match arg {
        "audio" => Ok(MediaKind::Audio),
        "video" => Ok(MediaKind::Video),
        other => Err(format!("Expected audio or video, got '{other}'")),
    }
}
