use chrono::{DateTime, Local};
use serde::{Serialize, Serializer};

fn opt_date<S: Serializer>(date: &Option<DateTime<Local>>, s: S) -> Result<S::Ok, S::Error> {
    match date {
        Some(date) => s.serialize_some(&date.to_rfc3339()),
        None => s.serialize_none(),
    }
}

/// Represents the sender of an item. Both the display name and the
/// address are optional, some stores only expose one of them.
#[derive(Clone, Debug, Default, Eq, Serialize)]
pub struct Mailbox {
    pub name: Option<String>,
    pub addr: Option<String>,
}

impl PartialEq for Mailbox {
    fn eq(&self, other: &Self) -> bool {
        match (&self.addr, &other.addr) {
            (Some(addr), Some(other_addr)) => addr == other_addr,
            _ => self.name == other.name,
        }
    }
}

impl Mailbox {
    pub fn new<N, A>(name: Option<N>, addr: Option<A>) -> Self
    where
        N: ToString,
        A: ToString,
    {
        Self {
            name: name.map(|name| name.to_string()),
            addr: addr.map(|addr| addr.to_string()),
        }
    }

    pub fn new_nameless<A>(addr: A) -> Self
    where
        A: ToString,
    {
        Self {
            name: None,
            addr: Some(addr.to_string()),
        }
    }
}

/// Represents an item of a mail store folder. The item is a message
/// subset: just enough metadata to derive a matching signature, no
/// body. Items carry no identifier that survives across stores, the
/// internal id is only meaningful to the backend that produced it.
#[derive(Clone, Debug, Default, Eq, Serialize)]
pub struct Item {
    /// Represents the backend-internal identifier. Never compared
    /// across stores.
    pub internal_id: String,
    /// Represents the Subject header.
    pub subject: Option<String>,
    #[serde(serialize_with = "opt_date")]
    /// Represents the receipt date, with second precision.
    pub received_at: Option<DateTime<Local>>,
    /// Represents the first sender.
    pub sender: Option<Mailbox>,
    /// Represents the item size in bytes.
    pub size: u64,
}

impl PartialEq for Item {
    fn eq(&self, other: &Self) -> bool {
        self.subject == other.subject
            && self.received_at == other.received_at
            && self.sender == other.sender
            && self.size == other.size
    }
}
