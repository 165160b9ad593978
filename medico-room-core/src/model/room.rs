use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;
use url::Url;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RoomAddressError {
    #[error("join code must be a 6-digit number, got {0:?}")]
    InvalidJoinCode(String),

    #[error("room password cannot be empty")]
    EmptyPassword,

    #[error("signaling url {0:?} cannot carry a room path")]
    InvalidBaseUrl(String),
}

/// Six-digit code that identifies a room on the signaling server.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, Hash, Eq, PartialEq)]
#[serde(try_from = "u32", into = "u32")]
pub struct JoinCode(u32);

impl JoinCode {
    pub const MIN: u32 = 100_000;
    pub const MAX: u32 = 999_999;

    pub fn value(&self) -> u32 {
        self.0
    }
}

impl TryFrom<u32> for JoinCode {
    type Error = RoomAddressError;

    fn try_from(value: u32) -> Result<Self, Self::Error> {
        if (Self::MIN..=Self::MAX).contains(&value) {
            Ok(Self(value))
        } else {
            Err(RoomAddressError::InvalidJoinCode(value.to_string()))
        }
    }
}

impl From<JoinCode> for u32 {
    fn from(code: JoinCode) -> Self {
        code.0
    }
}

impl FromStr for JoinCode {
    type Err = RoomAddressError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let value: u32 = trimmed
            .parse()
            .map_err(|_| RoomAddressError::InvalidJoinCode(trimmed.to_owned()))?;
        Self::try_from(value)
    }
}

impl fmt::Display for JoinCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Routing key of a room: join code plus password.
///
/// The pair addresses a signaling channel; it is not an access-control
/// boundary. The password never appears in `Debug` output.
#[derive(Clone, PartialEq, Eq)]
pub struct RoomAddress {
    join_code: JoinCode,
    password: String,
}

impl RoomAddress {
    pub fn new(join_code: JoinCode, password: &str) -> Result<Self, RoomAddressError> {
        let password = password.trim();
        if password.is_empty() {
            return Err(RoomAddressError::EmptyPassword);
        }

        Ok(Self {
            join_code,
            password: password.to_owned(),
        })
    }

    pub fn parse(join_code: &str, password: &str) -> Result<Self, RoomAddressError> {
        Self::new(join_code.parse()?, password)
    }

    pub fn join_code(&self) -> JoinCode {
        self.join_code
    }

    pub fn password(&self) -> &str {
        &self.password
    }

    /// Builds `{base}/ws/{join_code}/{password}`, percent-encoding the password.
    pub fn signaling_url(&self, base: &Url) -> Result<Url, RoomAddressError> {
        let mut url = base.clone();
        {
            let mut segments = url
                .path_segments_mut()
                .map_err(|_| RoomAddressError::InvalidBaseUrl(base.to_string()))?;
            segments
                .pop_if_empty()
                .push("ws")
                .push(&self.join_code.to_string())
                .push(&self.password);
        }
        Ok(url)
    }
}

impl fmt::Debug for RoomAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RoomAddress")
            .field("join_code", &self.join_code)
            .field("password", &"***")
            .finish()
    }
}

impl fmt::Display for RoomAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "room {}", self.join_code)
    }
}
