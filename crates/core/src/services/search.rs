//! Two-tier search over firmware and file objects.
//!
//! Results are not merged by rank: all firmware matches (sorted by vendor)
//! come first, then file-object matches (sorted by file name) or the parent
//! firmware of matching file objects. `skip`/`limit` are carried across the
//! tier boundary as a single running offset.

use std::collections::HashSet;

use serde_json::Value;
use tracing::debug;

use crate::db::{Collection, DbResult, Document, DocumentStore, FindOptions, Query, SortKey};
use crate::services::FrontendDb;

/// Drop repeated ids, keeping the first occurrence of each.
pub fn dedup_preserving_order<I>(ids: I) -> Vec<String>
where
    I: IntoIterator<Item = String>,
{
    let mut seen = HashSet::new();
    ids.into_iter().filter(|id| seen.insert(id.clone())).collect()
}

fn ids_of(documents: &[Document]) -> Vec<String> {
    documents
        .iter()
        .filter_map(|doc| doc.get("_id").and_then(Value::as_str))
        .map(str::to_string)
        .collect()
}

/// Keys of a document's `virtual_file_path` map, i.e. its parent firmware uids.
fn parent_uids(document: &Document) -> impl Iterator<Item = String> + '_ {
    document
        .get("virtual_file_path")
        .and_then(Value::as_object)
        .into_iter()
        .flat_map(|paths| paths.keys().cloned())
}

impl<S: DocumentStore> FrontendDb<S> {
    /// Ids matching `query`: firmware first, then file objects (or their parent firmware).
    ///
    /// A `limit` of `0` returns every match. When the firmware tier does not
    /// fill the page, the second tier is queried with
    /// `skip - firmware_count` (or `0` once the skip is used up) and the
    /// remaining limit.
    pub fn generic_search(
        &self,
        query: &Query,
        skip: usize,
        limit: usize,
        only_parent_firmware: bool,
    ) -> DbResult<Vec<String>> {
        let mut result = self.search_firmware(query, skip, limit)?;
        if result.len() < limit || limit == 0 {
            let max_firmware_results = self.store.count_documents(Collection::Firmwares, query)?;
            let skip = if skip > max_firmware_results { skip - max_firmware_results } else { 0 };
            let limit = if limit > 0 { limit - result.len() } else { 0 };
            debug!(%query, firmware_matches = max_firmware_results, skip, limit, "second search tier");
            if only_parent_firmware {
                result.extend(self.search_parent_firmware(query, skip, limit)?);
            } else {
                result.extend(self.search_files(query, skip, limit)?);
            }
        }
        Ok(dedup_preserving_order(result))
    }

    fn search_firmware(&self, query: &Query, skip: usize, limit: usize) -> DbResult<Vec<String>> {
        let options = FindOptions::new()
            .sort_by(SortKey::ascending("vendor"))
            .skip(skip)
            .limit(limit)
            .project(Vec::<String>::new());
        Ok(ids_of(&self.store.find(Collection::Firmwares, query, &options)?))
    }

    fn search_files(&self, query: &Query, skip: usize, limit: usize) -> DbResult<Vec<String>> {
        let options = FindOptions::new()
            .sort_by(SortKey::ascending("file_name"))
            .skip(skip)
            .limit(limit)
            .project(Vec::<String>::new());
        Ok(ids_of(&self.store.find(Collection::FileObjects, query, &options)?))
    }

    fn search_parent_firmware(&self, query: &Query, skip: usize, limit: usize) -> DbResult<Vec<String>> {
        let options = FindOptions::new().project(["virtual_file_path"]);
        let matches = self.store.find(Collection::FileObjects, query, &options)?;
        let parents = dedup_preserving_order(matches.iter().flat_map(parent_uids));
        self.search_firmware(&Query::id_in(parents), skip, limit)
    }

    /// Number of results a search for `query` can produce.
    ///
    /// Without `only_parent_firmwares` this counts matching file objects (all
    /// of them for `{}`). With it, it counts distinct firmware reachable by the
    /// query, either by matching directly or by containing a matching file
    /// object; an empty query then counts as matching nothing.
    pub fn get_number_of_total_matches(&self, query: &Query, only_parent_firmwares: bool) -> DbResult<usize> {
        if !only_parent_firmwares {
            return self.store.count_documents(Collection::FileObjects, query);
        }
        if query.is_empty() {
            return Ok(0);
        }
        let firmware = self.store.find(Collection::Firmwares, query, &FindOptions::new().project(Vec::<String>::new()))?;
        let mut uids: HashSet<String> = ids_of(&firmware).into_iter().collect();

        let options = FindOptions::new().project(["virtual_file_path"]);
        for doc in self.store.find(Collection::FileObjects, query, &options)? {
            uids.extend(parent_uids(&doc));
        }
        Ok(uids.len())
    }

    /// Firmware ids for the REST listing.
    ///
    /// `recursive` searches through file objects as well (parent firmware
    /// tier); otherwise firmware matching `query` are listed newest first.
    pub fn rest_get_firmware_uids(
        &self,
        offset: usize,
        limit: usize,
        query: Option<&Query>,
        recursive: bool,
    ) -> DbResult<Vec<String>> {
        let all = Query::all();
        let query = query.unwrap_or(&all);
        if recursive {
            return self.generic_search(query, offset, limit, true);
        }
        let options = FindOptions::new()
            .sort_by(SortKey::descending("submission_date"))
            .skip(offset)
            .limit(limit)
            .project(Vec::<String>::new());
        Ok(ids_of(&self.store.find(Collection::Firmwares, query, &options)?))
    }

    /// File object ids for the REST listing, in store order.
    pub fn rest_get_file_object_uids(
        &self,
        offset: usize,
        limit: usize,
        query: Option<&Query>,
    ) -> DbResult<Vec<String>> {
        let all = Query::all();
        let options = FindOptions::new().skip(offset).limit(limit).project(Vec::<String>::new());
        Ok(ids_of(&self.store.find(Collection::FileObjects, query.unwrap_or(&all), &options)?))
    }
}
