//! Shared fixtures for the proxy-deck integration tests.
//!
//! `ScriptedFetcher` serves canned responses by exact URL and records every
//! request, so tests can assert on what reached the "network".

#![allow(dead_code)]

use proxy_deck::{Fetcher, HttpResponse, Result};
use serde_json::{Value, json};
use std::cell::RefCell;
use std::collections::{HashMap, VecDeque};

pub const API: &str = "https://api.test";

#[derive(Default)]
pub struct ScriptedFetcher {
    responses: HashMap<String, HttpResponse>,
    sequences: RefCell<HashMap<String, VecDeque<HttpResponse>>>,
    requests: RefCell<Vec<String>>,
}

impl ScriptedFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn json(mut self, url: &str, status: u16, body: Value) -> Self {
        self.responses.insert(
            url.to_string(),
            HttpResponse {
                status,
                body: serde_json::to_vec(&body).unwrap(),
            },
        );
        self
    }

    pub fn bytes(mut self, url: &str, status: u16, body: &[u8]) -> Self {
        self.responses.insert(
            url.to_string(),
            HttpResponse {
                status,
                body: body.to_vec(),
            },
        );
        self
    }

    /// Serve `bodies` one per call, then 404
    pub fn sequence(self, url: &str, bodies: Vec<Value>) -> Self {
        let queue = bodies
            .into_iter()
            .map(|body| HttpResponse {
                status: 200,
                body: serde_json::to_vec(&body).unwrap(),
            })
            .collect();
        self.sequences.borrow_mut().insert(url.to_string(), queue);
        self
    }

    pub fn requests(&self) -> Vec<String> {
        self.requests.borrow().clone()
    }

    pub fn request_count(&self) -> usize {
        self.requests.borrow().len()
    }

    pub fn count_of(&self, url: &str) -> usize {
        self.requests.borrow().iter().filter(|r| *r == url).count()
    }
}

impl Fetcher for ScriptedFetcher {
    fn get(&self, url: &str) -> Result<HttpResponse> {
        self.requests.borrow_mut().push(url.to_string());

        if let Some(queue) = self.sequences.borrow_mut().get_mut(url) {
            if let Some(response) = queue.pop_front() {
                return Ok(response);
            }
        }

        Ok(self.responses.get(url).cloned().unwrap_or_else(|| HttpResponse {
            status: 404,
            body: serde_json::to_vec(&json!({"object": "error", "code": "not_found"})).unwrap(),
        }))
    }
}

pub fn named_url(name: &str) -> String {
    proxy_deck::request_url(&format!("{API}/cards/named"), &[("fuzzy", name)]).unwrap()
}

pub fn print_url(set: &str, number: &str, lang: Option<&str>) -> String {
    match lang {
        Some(lang) => format!("{API}/cards/{set}/{number}/{lang}"),
        None => format!("{API}/cards/{set}/{number}"),
    }
}

/// A single-faced card record
pub fn card_json(name: &str, set: &str, number: &str, lang: &str, image_status: &str) -> Value {
    json!({
        "object": "card",
        "name": name,
        "lang": lang,
        "set": set,
        "collector_number": number,
        "type_line": "Instant",
        "image_status": image_status,
        "image_uris": {
            "normal": format!("https://img.test/{set}/{number}/{lang}/normal.jpg"),
            "large": format!("https://img.test/{set}/{number}/{lang}/large.jpg"),
            "png": format!("https://img.test/{set}/{number}/{lang}.png"),
        },
        "scryfall_uri": format!("https://db.test/card/{set}/{number}/{lang}"),
    })
}
