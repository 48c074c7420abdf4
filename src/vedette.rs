//! The featured-item enrichment pipeline.
//!
//! One discovery-search page tells us *which* items are featured, but not
//! what to show for them: the promotional imagery lives in a bundle named
//! `VEDETTE` attached to each item, and the bundle's bitstreams are yet
//! another lookup away. So for every object on the page we walk its bundles,
//! then the bitstreams, and fold the result into a flat [`FeaturedItem`].
//!
//! The per-item lookups all run concurrently and each one is allowed to fail
//! on its own: a dead link, a malformed body, or simply no `VEDETTE` bundle
//! degrades that one item to "not featured" and the rest of the page goes
//! out as usual. The only failure that surfaces to the caller is not getting
//! a usable search page at all.

use futures::future;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use thiserror::Error;
use tracing::warn;

use crate::upstream::{Upstream, UpstreamError};

/// Name of the bundle holding an item's promotional imagery. The match is
/// exact and case-sensitive.
pub const FEATURED_BUNDLE: &str = "VEDETTE";

const TITLE_FIELD: &str = "dc.title";
const DESCRIPTION_FIELD: &str = "dc.description";

// Wire shapes. These mirror the HAL envelopes of the DSpace REST API; we only
// name the fields we read. The search page keeps its objects as raw JSON so
// that one malformed object can be dropped without poisoning the page.

#[derive(Deserialize)]
struct SearchResponse {
    #[serde(rename = "_embedded")]
    embedded: Option<SearchResponseEmbedded>,
}

#[derive(Deserialize)]
struct SearchResponseEmbedded {
    #[serde(rename = "searchResult")]
    search_result: Option<SearchResultEnvelope>,
}

#[derive(Deserialize)]
struct SearchResultEnvelope {
    #[serde(rename = "_embedded")]
    embedded: Option<SearchObjectsEnvelope>,
}

#[derive(Deserialize)]
struct SearchObjectsEnvelope {
    #[serde(default)]
    objects: Vec<Value>,
}

impl SearchResponse {
    fn into_objects(self) -> Option<Vec<Value>> {
        Some(self.embedded?.search_result?.embedded?.objects)
    }
}

#[derive(Deserialize)]
struct SearchObject {
    #[serde(rename = "_embedded")]
    embedded: SearchObjectEmbedded,
}

#[derive(Deserialize)]
struct SearchObjectEmbedded {
    #[serde(rename = "indexableObject")]
    indexable_object: IndexableObject,
}

#[derive(Deserialize)]
struct IndexableObject {
    id: String,
    #[serde(default)]
    metadata: HashMap<String, Vec<MetadataValue>>,
    #[serde(rename = "_links")]
    links: IndexableLinks,
}

#[derive(Deserialize)]
struct MetadataValue {
    value: String,
}

#[derive(Deserialize)]
struct IndexableLinks {
    bundles: Href,
}

#[derive(Deserialize)]
struct Href {
    href: String,
}

#[derive(Deserialize)]
struct BundleList {
    #[serde(rename = "_embedded")]
    embedded: BundlesEmbedded,
}

#[derive(Deserialize)]
struct BundlesEmbedded {
    #[serde(default)]
    bundles: Vec<Bundle>,
}

#[derive(Deserialize)]
struct Bundle {
    name: String,
    #[serde(rename = "_links")]
    links: BundleLinks,
}

#[derive(Deserialize)]
struct BundleLinks {
    bitstreams: Href,
}

#[derive(Deserialize)]
struct BitstreamList {
    #[serde(rename = "_embedded")]
    embedded: BitstreamsEmbedded,
}

#[derive(Deserialize)]
struct BitstreamsEmbedded {
    #[serde(default)]
    bitstreams: Vec<Bitstream>,
}

#[derive(Deserialize)]
struct Bitstream {
    id: String,
    name: Option<String>,
    #[serde(rename = "sizeBytes")]
    size_bytes: u64,
    #[serde(rename = "_links")]
    links: BitstreamLinks,
}

#[derive(Deserialize)]
struct BitstreamLinks {
    content: Href,
}

// Output shapes, i.e. what the front end actually consumes. `title` and
// `description` serialize as explicit nulls when the item has none; `scope`
// is omitted entirely on unscoped requests.

#[derive(Debug, Clone, Serialize)]
pub struct FeaturedItem {
    pub id: String,
    pub title: Option<String>,
    pub description: Option<String>,
    pub group: Group,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scope: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Group {
    pub name: String,
    pub image: Vec<GroupImage>,
}

#[derive(Debug, Clone, Serialize)]
pub struct GroupImage {
    pub id: String,
    pub name: Option<String>,
    pub url: String,
    #[serde(rename = "sizeBytes")]
    pub size_bytes: u64,
}

/// The one whole-page failure mode: we could not get a usable search page.
#[derive(Debug, Error)]
pub enum FeaturedPageError {
    #[error(transparent)]
    Upstream(#[from] UpstreamError),

    #[error("search response has no embedded search-result envelope")]
    MissingEnvelope,
}

/// Why one search object was left out of the response.
#[derive(Debug, Error)]
pub enum DropReason {
    #[error("no VEDETTE bundle")]
    NoFeaturedBundle,

    #[error("the VEDETTE bundle has no bitstreams")]
    NoBitstreams,

    #[error("search object does not have the expected shape: {0}")]
    Malformed(#[source] serde_json::Error),

    #[error(transparent)]
    Lookup(#[from] UpstreamError),
}

/// The fate of one search object, as an explicit value rather than control
/// flow: either it became a [`FeaturedItem`], or it was dropped for a
/// recorded reason.
pub enum ItemOutcome {
    Featured(FeaturedItem),
    Dropped {
        id: Option<String>,
        reason: DropReason,
    },
}

/// Fetch one search page and enrich every object on it, concurrently.
///
/// Results come back in page order; any shuffling happens further up. Objects
/// that could not be enriched are logged and excluded, so the returned list
/// can be shorter than the page.
pub async fn fetch_featured_items(
    upstream: &Upstream,
    api_url: &str,
    scope: Option<&str>,
) -> Result<Vec<FeaturedItem>, FeaturedPageError> {
    let page: SearchResponse = upstream.get_json(api_url).await?;

    let objects = page
        .into_objects()
        .ok_or(FeaturedPageError::MissingEnvelope)?;

    // All lookups in flight at once; join_all keeps results in page order
    // regardless of completion order, and a failed lookup does not cancel
    // its siblings.
    let outcomes = future::join_all(
        objects
            .into_iter()
            .map(|raw| enrich_object(upstream, raw, scope)),
    )
    .await;

    Ok(outcomes
        .into_iter()
        .filter_map(|outcome| match outcome {
            ItemOutcome::Featured(item) => Some(item),
            ItemOutcome::Dropped { id, reason } => {
                warn!(
                    item = id.as_deref().unwrap_or("<unparsed>"),
                    "dropping search object: {reason}"
                );
                None
            }
        })
        .collect())
}

/// Turn one raw search object into its outcome. Nothing in here can fail the
/// page; every error path ends in [`ItemOutcome::Dropped`].
async fn enrich_object(upstream: &Upstream, raw: Value, scope: Option<&str>) -> ItemOutcome {
    let object: SearchObject = match serde_json::from_value(raw) {
        Ok(object) => object,
        Err(err) => {
            return ItemOutcome::Dropped {
                id: None,
                reason: DropReason::Malformed(err),
            }
        }
    };

    let object = object.embedded.indexable_object;

    match resolve_group(upstream, &object).await {
        Ok(group) => ItemOutcome::Featured(FeaturedItem {
            title: first_metadata_value(&object, TITLE_FIELD),
            description: first_metadata_value(&object, DESCRIPTION_FIELD),
            id: object.id,
            group,
            scope: scope.map(str::to_owned),
        }),

        Err(reason) => ItemOutcome::Dropped {
            id: Some(object.id),
            reason,
        },
    }
}

/// Resolve one item's promotional image group: fetch its bundle list, pick
/// the `VEDETTE` bundle, fetch that bundle's bitstreams. Coming up
/// empty-handed at any step is a reason to drop the item, never an error.
async fn resolve_group(
    upstream: &Upstream,
    object: &IndexableObject,
) -> Result<Group, DropReason> {
    let bundles: BundleList = upstream.get_json(&object.links.bundles.href).await?;

    let bundle =
        find_featured_bundle(&bundles.embedded.bundles).ok_or(DropReason::NoFeaturedBundle)?;

    let bitstreams: BitstreamList = upstream.get_json(&bundle.links.bitstreams.href).await?;
    let bitstreams = bitstreams.embedded.bitstreams;

    if bitstreams.is_empty() {
        return Err(DropReason::NoBitstreams);
    }

    Ok(Group {
        name: bundle.name.clone(),
        image: bitstreams
            .into_iter()
            .map(|bitstream| GroupImage {
                id: bitstream.id,
                name: bitstream.name,
                url: bitstream.links.content.href,
                size_bytes: bitstream.size_bytes,
            })
            .collect(),
    })
}

/// Exact, case-sensitive name match. When several bundles carry the name,
/// the first one in list order wins.
fn find_featured_bundle(bundles: &[Bundle]) -> Option<&Bundle> {
    bundles.iter().find(|bundle| bundle.name == FEATURED_BUNDLE)
}

fn first_metadata_value(object: &IndexableObject, field: &str) -> Option<String> {
    object
        .metadata
        .get(field)
        .and_then(|values| values.first())
        .map(|entry| entry.value.clone())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn parse_page(value: Value) -> SearchResponse {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn missing_envelope_is_detected_at_every_level() {
        assert!(parse_page(json!({})).into_objects().is_none());
        assert!(parse_page(json!({ "_embedded": {} }))
            .into_objects()
            .is_none());
        assert!(
            parse_page(json!({ "_embedded": { "searchResult": {} } }))
                .into_objects()
                .is_none()
        );
    }

    #[test]
    fn present_envelope_yields_the_objects() {
        let page = parse_page(json!({
            "_embedded": { "searchResult": { "_embedded": { "objects": [1, 2, 3] } } }
        }));

        assert_eq!(page.into_objects().unwrap().len(), 3);
    }

    #[test]
    fn first_featured_bundle_wins() {
        let list: BundleList = serde_json::from_value(json!({
            "_embedded": { "bundles": [
                { "name": "ORIGINAL", "_links": { "bitstreams": { "href": "http://x/0" } } },
                { "name": "VEDETTE", "_links": { "bitstreams": { "href": "http://x/1" } } },
                { "name": "VEDETTE", "_links": { "bitstreams": { "href": "http://x/2" } } },
            ] }
        }))
        .unwrap();

        let bundle = find_featured_bundle(&list.embedded.bundles).unwrap();
        assert_eq!(bundle.links.bitstreams.href, "http://x/1");
    }

    #[test]
    fn featured_bundle_match_is_case_sensitive() {
        let list: BundleList = serde_json::from_value(json!({
            "_embedded": { "bundles": [
                { "name": "Vedette", "_links": { "bitstreams": { "href": "http://x/0" } } },
            ] }
        }))
        .unwrap();

        assert!(find_featured_bundle(&list.embedded.bundles).is_none());
    }

    #[test]
    fn metadata_projection_takes_the_first_value_or_none() {
        let object: IndexableObject = serde_json::from_value(json!({
            "id": "item-1",
            "metadata": {
                "dc.title": [ { "value": "Premier titre" }, { "value": "Second titre" } ],
                "dc.description": []
            },
            "_links": { "bundles": { "href": "http://x/bundles" } }
        }))
        .unwrap();

        assert_eq!(
            first_metadata_value(&object, TITLE_FIELD).as_deref(),
            Some("Premier titre")
        );
        assert_eq!(first_metadata_value(&object, DESCRIPTION_FIELD), None);
        assert_eq!(first_metadata_value(&object, "dc.subject"), None);
    }

    #[tokio::test]
    async fn unparseable_search_object_is_dropped_not_fatal() {
        let upstream = Upstream::new().unwrap();
        let outcome = enrich_object(&upstream, json!({ "surprise": true }), None).await;

        match outcome {
            ItemOutcome::Dropped { id: None, reason } => {
                assert!(matches!(reason, DropReason::Malformed(_)));
            }
            _ => panic!("expected the object to be dropped"),
        }
    }

    #[test]
    fn scope_is_omitted_from_json_when_absent() {
        let item = FeaturedItem {
            id: "item-1".to_owned(),
            title: None,
            description: Some("desc".to_owned()),
            group: Group {
                name: FEATURED_BUNDLE.to_owned(),
                image: vec![],
            },
            scope: None,
        };

        let value = serde_json::to_value(&item).unwrap();
        let keys: Vec<&String> = value.as_object().unwrap().keys().collect();

        // Absent title stays as an explicit null, absent scope disappears.
        assert!(value.get("title").unwrap().is_null());
        assert!(!keys.iter().any(|k| *k == "scope"));
    }

    #[test]
    fn scoped_item_serializes_its_scope() {
        let item = FeaturedItem {
            id: "item-1".to_owned(),
            title: Some("titre".to_owned()),
            description: None,
            group: Group {
                name: FEATURED_BUNDLE.to_owned(),
                image: vec![GroupImage {
                    id: "bit-1".to_owned(),
                    name: Some("cover.jpg".to_owned()),
                    url: "http://x/content".to_owned(),
                    size_bytes: 1234,
                }],
            },
            scope: Some("col-9".to_owned()),
        };

        let value = serde_json::to_value(&item).unwrap();
        assert_eq!(value["scope"], "col-9");
        assert_eq!(value["group"]["image"][0]["sizeBytes"], 1234);
    }
}
