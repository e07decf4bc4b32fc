//! User facing notification record.

use std::fmt;

/// A notification about a newly observed road closure.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NotificationRecord {
    /// Id of the road event the notification is about.
    pub id: String,
    /// Message shown to the user, `<road name>: <description>`.
    pub message: String,
}

impl fmt::Display for NotificationRecord {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "[{}] {}", self.id, self.message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        let record = NotificationRecord {
            id: "evt-9".to_string(),
            message: "Highway 5: Closed near Hope".to_string(),
        };

        assert_eq!(format!("{}", record), "[evt-9] Highway 5: Closed near Hope");
    }
}
