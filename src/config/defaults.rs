use std::time::Duration;

pub(super) fn default_ip() -> String {
    "0.0.0.0".to_string()
}

pub(super) const fn default_port() -> u16 {
    514
}

pub(super) const fn default_max_message_bytes() -> usize {
    4096
}

pub(super) const fn default_read_timeout() -> Duration {
    Duration::from_secs(10)
}

pub(super) const fn default_max_connections() -> usize {
    64
}

pub(super) fn default_title() -> String {
    "Alarm Notification".to_string()
}

pub(super) const fn default_request_timeout() -> Duration {
    Duration::from_secs(10)
}

pub(super) const fn default_connect_timeout() -> Duration {
    Duration::from_secs(5)
}

pub(super) const fn default_max_attempts() -> usize {
    1
}
