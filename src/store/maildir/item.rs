//! Maildir item module.
//!
//! This module provides conversion utilities from raw maildir
//! entries to store items.

use chrono::{DateTime, Local};
use log::trace;

use crate::{Item, Mailbox};

use super::store::{Error, Result};

/// Represents the raw item returned by the `maildir` crate.
pub type RawItem = maildir::MailEntry;

/// Represents a list of raw items returned by the `maildir` crate.
pub type RawItems = maildir::MailEntries;

pub fn from_raws(entries: RawItems) -> Result<Vec<Item>> {
    let mut items = Vec::new();
    for entry in entries {
        let entry = entry.map_err(Error::DecodeEntryError)?;
        items.push(from_raw(entry)?);
    }
    Ok(items)
}

pub fn from_raw(mut entry: RawItem) -> Result<Item> {
    let mut item = Item {
        internal_id: entry.id().to_owned(),
        ..Item::default()
    };

    let parsed = entry.parsed().map_err(Error::ParseMsgError)?;
    item.size = parsed.raw_bytes.len() as u64;

    for h in parsed.get_headers() {
        let k = h.get_key();

        let v = rfc2047_decoder::decode(h.get_value_raw())
            .map_err(|err| Error::DecodeHeaderError(err, k.to_owned()))?;

        match k.to_lowercase().as_str() {
            "date" => {
                // Strips the trailing "(TZ)" comment some agents
                // append after the rfc2822 date.
                item.received_at =
                    DateTime::parse_from_rfc2822(v.split_at(v.find(" (").unwrap_or(v.len())).0)
                        .map(|date| date.with_timezone(&Local))
                        .ok()
            }
            "subject" => {
                item.subject = Some(v);
            }
            "from" => {
                item.sender = mailparse::addrparse(&v)
                    .map_err(|err| Error::ParseHeaderError(err, k.to_owned()))?
                    .first()
                    .map(|addr| match addr {
                        mailparse::MailAddr::Single(mailparse::SingleInfo {
                            display_name,
                            addr,
                        }) => Mailbox::new(display_name.as_ref(), Some(addr)),
                        mailparse::MailAddr::Group(mailparse::GroupInfo {
                            group_name, ..
                        }) => Mailbox::new(Some(group_name), None::<String>),
                    });
            }
            _ => (),
        }
    }

    trace!("item: {:?}", item);
    Ok(item)
}
