/// Top-level message class carried in the header's `main_type` field.
#[derive(Eq, PartialEq, Copy, Clone, Debug)]
#[repr(u16)]
pub enum MainType {
    Login = 0,
    Heartbeat = 1,
    NatDetect = 2,
    Push = 3,
    P2P = 4,
    Relay = 5,
    Report = 6,
    Query = 7,
    Unknown = 0xFFFF,
}

impl From<u16> for MainType {
    fn from(value: u16) -> Self {
        match value {
            0 => MainType::Login,
            1 => MainType::Heartbeat,
            2 => MainType::NatDetect,
            3 => MainType::Push,
            4 => MainType::P2P,
            5 => MainType::Relay,
            6 => MainType::Report,
            7 => MainType::Query,
            _ => MainType::Unknown,
        }
    }
}

impl From<MainType> for u16 {
    fn from(value: MainType) -> Self {
        value as u16
    }
}

/// Sub types of [`MainType::Heartbeat`].
#[derive(Eq, PartialEq, Copy, Clone, Debug)]
#[repr(u16)]
pub enum HeartbeatType {
    Ping = 0,
    Pong = 1,
    Unknown = 0xFFFF,
}

impl From<u16> for HeartbeatType {
    fn from(value: u16) -> Self {
        match value {
            0 => HeartbeatType::Ping,
            1 => HeartbeatType::Pong,
            _ => HeartbeatType::Unknown,
        }
    }
}

impl From<HeartbeatType> for u16 {
    fn from(value: HeartbeatType) -> Self {
        value as u16
    }
}

#[cfg(test)]
mod test {
    use super::{HeartbeatType, MainType};

    #[test]
    fn test_new_protocol() {
        assert_eq!(MainType::from(1), MainType::Heartbeat);
        assert_eq!(MainType::from(128), MainType::Unknown);
        assert_eq!(u16::from(MainType::Query), 7);
        assert_eq!(HeartbeatType::from(1), HeartbeatType::Pong);
        assert_eq!(HeartbeatType::from(7), HeartbeatType::Unknown);
    }
}
