use crate::types::{Listing, RawAuction};
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde_json::Value;
use std::sync::Arc;
use tracing::debug;

/// Decoder for the opaque serialized item payload carried by each listing.
///
/// The production feed ships NBT blobs; this crate only requires that the
/// decoder produce a JSON-like tree so the item identifier can be extracted
/// at a fixed path. The implementation is injected by the embedding process.
pub trait DecodeItemTag: Send + Sync {
    fn decode_tag(&self, bytes: &[u8]) -> Option<Value>;
}

/// Normalizes raw feed listings into persisted [`Listing`] records.
pub struct ListingDecoder {
    tag_decoder: Arc<dyn DecodeItemTag>,
}

impl ListingDecoder {
    pub fn new(tag_decoder: Arc<dyn DecodeItemTag>) -> Self {
        Self { tag_decoder }
    }

    /// Builds a [`Listing`] from a raw feed record. Decoding never fails the
    /// pipeline: an undecodable payload degrades to an empty item id.
    pub fn normalize(&self, raw: &RawAuction) -> Listing {
        let item_id = self.extract_item_id(&raw.item_bytes);

        Listing {
            uuid: raw.uuid.clone(),
            seller_uuid: raw.auctioneer.clone(),
            start_time: raw.start_time(),
            end_time: raw.end_time(),
            item_name: raw.item_name.clone(),
            item_bytes: raw.item_bytes.clone(),
            item_id,
            bin: raw.bin,
            starting_bid: raw.starting_bid,
            highest_bid: raw.highest_bid_amount,
        }
    }

    /// The item identifier lives at `i[0].tag.ExtraAttributes.id` in the
    /// decoded tag tree. Any missing segment yields an empty identifier.
    fn extract_item_id(&self, item_bytes: &str) -> String {
        let bytes = match STANDARD.decode(item_bytes) {
            Ok(bytes) => bytes,
            Err(e) => {
                debug!("Item payload is not valid base64: {}", e);
                return String::new();
            }
        };

        let tag = match self.tag_decoder.decode_tag(&bytes) {
            Some(tag) => tag,
            None => {
                debug!("Item payload could not be decoded into a tag");
                return String::new();
            }
        };

        tag.get("i")
            .and_then(|items| items.get(0))
            .and_then(|item| item.get("tag"))
            .and_then(|tag| tag.get("ExtraAttributes"))
            .and_then(|attrs| attrs.get("id"))
            .and_then(|id| id.as_str())
            .unwrap_or("")
            .to_string()
    }
}
