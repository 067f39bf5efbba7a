// The hosted ballot collection, read through the Firestore REST interface.

use serde::Deserialize;
use serde_json::Map as JSMap;

use crate::dashboard::{io_common::record_from_fields, *};

const PAGE_SIZE: &str = "300";

#[derive(PartialEq, Debug, Clone, Deserialize)]
struct FirestoreDocument {
    name: String,
    #[serde(default)]
    fields: JSMap<String, JSValue>,
}

#[derive(PartialEq, Debug, Clone, Deserialize)]
struct ListDocumentsResponse {
    #[serde(default)]
    documents: Vec<FirestoreDocument>,
    #[serde(rename = "nextPageToken")]
    next_page_token: Option<String>,
}

pub fn read_firestore_records(
    settings: &FirebaseSettings,
    collection: &str,
    grant: &AccessGrant,
    candidate_keys: &[String],
    resolution_count: u32,
) -> BDashResult<Vec<VoterRecord>> {
    let docs = list_documents(settings, collection, grant)?;
    let res = docs
        .iter()
        .map(|(id, fields)| record_from_fields(id.clone(), fields, candidate_keys, resolution_count))
        .collect();
    Ok(res)
}

/// All the documents of the collection, as (document id, decoded fields).
fn list_documents(
    settings: &FirebaseSettings,
    collection: &str,
    grant: &AccessGrant,
) -> BDashResult<Vec<(String, JSMap<String, JSValue>)>> {
    let url = format!(
        "{}/v1/projects/{}/databases/{}/documents/{}",
        settings.firestore_endpoint(),
        settings.project_id,
        settings.database_id(),
        collection
    );
    // The key is only needed when there is no signed-in user.
    let api_key = settings.api_key().ok();
    let client = reqwest::blocking::Client::new();

    let mut res: Vec<(String, JSMap<String, JSValue>)> = Vec::new();
    let mut page_token: Option<String> = None;
    loop {
        let mut query: Vec<(&str, String)> = vec![("pageSize", PAGE_SIZE.to_string())];
        if let Some(t) = page_token.as_ref() {
            query.push(("pageToken", t.clone()));
        }
        if let Some(k) = api_key.as_ref() {
            query.push(("key", k.clone()));
        }
        let mut req = client.get(url.as_str()).query(&query);
        if let Some(token) = grant.id_token() {
            req = req.bearer_auth(token);
        }
        debug!("list_documents: GET {} page {:?}", url, page_token);
        let resp = req.send().context(HttpRequestSnafu { url: url.clone() })?;
        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().unwrap_or_default();
            return Err(Box::new(DashboardError::FirestoreStatus {
                status: status.as_u16(),
                body,
            }));
        }
        let page: ListDocumentsResponse = resp
            .json()
            .context(HttpRequestSnafu { url: url.clone() })?;
        let next = decode_page(page, &mut res);
        debug!("list_documents: {} documents so far", res.len());
        match next {
            Some(t) if !t.is_empty() => page_token = Some(t),
            _ => break,
        }
    }
    Ok(res)
}

fn decode_page(
    page: ListDocumentsResponse,
    res: &mut Vec<(String, JSMap<String, JSValue>)>,
) -> Option<String> {
    for doc in page.documents.iter() {
        res.push((document_id(&doc.name), decode_fields(&doc.fields)));
    }
    page.next_page_token
}

/// The last segment of `projects/p/databases/d/documents/collection/id`.
fn document_id(name: &str) -> String {
    name.rsplit('/').next().unwrap_or(name).to_string()
}

fn decode_fields(fields: &JSMap<String, JSValue>) -> JSMap<String, JSValue> {
    fields
        .iter()
        .map(|(k, v)| (k.clone(), decode_value(v)))
        .collect()
}

/// Turns a typed Firestore value (`{"integerValue": "12"}`) into plain JSON.
fn decode_value(v: &JSValue) -> JSValue {
    let obj = match v.as_object() {
        Some(x) => x,
        None => return JSValue::Null,
    };
    let (kind, inner) = match obj.iter().next() {
        Some(x) => x,
        None => return JSValue::Null,
    };
    match (kind.as_str(), inner) {
        ("booleanValue", JSValue::Bool(b)) => JSValue::Bool(*b),
        // 64-bit integers are transmitted as text.
        ("integerValue", JSValue::String(s)) => s
            .parse::<i64>()
            .map(JSValue::from)
            .unwrap_or_else(|_| JSValue::String(s.clone())),
        ("integerValue", JSValue::Number(n)) => JSValue::Number(n.clone()),
        ("doubleValue", JSValue::Number(n)) => JSValue::Number(n.clone()),
        ("stringValue", JSValue::String(s))
        | ("timestampValue", JSValue::String(s))
        | ("referenceValue", JSValue::String(s)) => JSValue::String(s.clone()),
        ("mapValue", JSValue::Object(m)) => {
            let empty = JSMap::new();
            let fields = m.get("fields").and_then(|f| f.as_object()).unwrap_or(&empty);
            JSValue::Object(decode_fields(fields))
        }
        ("arrayValue", JSValue::Object(m)) => {
            let values: Vec<JSValue> = m
                .get("values")
                .and_then(|a| a.as_array())
                .map(|a| a.iter().map(decode_value).collect())
                .unwrap_or_default();
            JSValue::Array(values)
        }
        _ => JSValue::Null,
    }
}
