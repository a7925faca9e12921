//! In-memory `MapDataProvider` and a local HTTP stub used by unit tests.

use std::collections::HashMap;
use std::io::{BufRead, BufReader, Read, Write};
use std::net::{TcpListener, TcpStream};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;

use geo::{Coord, Point};

use crate::api::{MapDataProvider, RawEdge, RawFeature, RawFeatures, RawGraph};
use crate::domain::{FeatureId, Geometry, NetworkType, Node, PlaceDescriptor, TagFilter};
use crate::error::ProviderError;

/// Returns canned data, or `PlaceNotFound` when the canned result is `None`.
/// Counts calls so tests can assert that validation happens first.
#[derive(Debug, Default)]
pub struct StubProvider {
    pub graph: Option<RawGraph>,
    pub features: Option<RawFeatures>,
    pub graph_calls: AtomicUsize,
    pub feature_calls: AtomicUsize,
}

impl StubProvider {
    pub fn new(graph: Option<RawGraph>, features: Option<RawFeatures>) -> Self {
        Self {
            graph,
            features,
            ..Self::default()
        }
    }

    pub fn calls(&self) -> (usize, usize) {
        (
            self.graph_calls.load(Ordering::SeqCst),
            self.feature_calls.load(Ordering::SeqCst),
        )
    }
}

impl MapDataProvider for StubProvider {
    fn fetch_graph(
        &self,
        place: &PlaceDescriptor,
        _network_type: NetworkType,
    ) -> Result<RawGraph, ProviderError> {
        self.graph_calls.fetch_add(1, Ordering::SeqCst);
        self.graph
            .clone()
            .ok_or_else(|| ProviderError::PlaceNotFound(place.identifier().to_string()))
    }

    fn fetch_features(
        &self,
        place: &PlaceDescriptor,
        _tags: &TagFilter,
    ) -> Result<RawFeatures, ProviderError> {
        self.feature_calls.fetch_add(1, Ordering::SeqCst);
        self.features
            .clone()
            .ok_or_else(|| ProviderError::PlaceNotFound(place.identifier().to_string()))
    }
}

pub fn raw_node(id: u64, lat: f64, lon: f64) -> Node {
    Node {
        id,
        coord: Coord { x: lon, y: lat },
    }
}

pub fn raw_edge(from: u64, to: u64) -> RawEdge {
    RawEdge {
        from,
        to,
        name: None,
        highway: Some("footway".to_string()),
    }
}

/// Three nodes around Salzburg's old town joined in a cycle
pub fn triangle_graph() -> RawGraph {
    RawGraph {
        crs: Default::default(),
        nodes: vec![
            raw_node(1, 47.79, 13.03),
            raw_node(2, 47.80, 13.05),
            raw_node(3, 47.81, 13.04),
        ],
        edges: vec![raw_edge(1, 2), raw_edge(2, 3), raw_edge(3, 1)],
    }
}

pub fn raw_point(id: u64, lat: f64, lon: f64, tags: &[(&str, &str)]) -> RawFeature {
    RawFeature {
        id: FeatureId::node(id),
        geometry: Geometry::Point(Point::new(lon, lat)),
        tags: tags
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect::<HashMap<_, _>>(),
    }
}

/// Minimal HTTP/1.1 server on a loopback port.
///
/// Each request is answered by `respond(request_line)` with a status and a
/// JSON body, then the connection is closed. Request lines are recorded in
/// arrival order.
pub struct StubServer {
    base_url: String,
    requests: Arc<Mutex<Vec<String>>>,
}

impl StubServer {
    pub fn start<F>(respond: F) -> Self
    where
        F: Fn(&str) -> (u16, String) + Send + 'static,
    {
        let listener = TcpListener::bind("127.0.0.1:0").expect("bind stub server");
        let base_url = format!("http://{}", listener.local_addr().expect("local addr"));
        let requests = Arc::new(Mutex::new(Vec::new()));

        let log = Arc::clone(&requests);
        thread::spawn(move || {
            for stream in listener.incoming().flatten() {
                let Some(line) = read_request(&stream) else {
                    continue;
                };
                log.lock().expect("request log").push(line.clone());
                let (status, body) = respond(&line);
                write_response(stream, status, &body);
            }
        });

        Self { base_url, requests }
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    pub fn requests(&self) -> Vec<String> {
        self.requests.lock().expect("request log").clone()
    }
}

/// Read one request, returning its request line (e.g. `GET /search?q=x HTTP/1.1`)
fn read_request(stream: &TcpStream) -> Option<String> {
    let mut reader = BufReader::new(stream);
    let mut request_line = String::new();
    reader.read_line(&mut request_line).ok()?;

    let mut content_length = 0;
    loop {
        let mut header = String::new();
        if reader.read_line(&mut header).ok()? == 0 || header.trim().is_empty() {
            break;
        }
        if let Some((name, value)) = header.split_once(':') {
            if name.eq_ignore_ascii_case("content-length") {
                content_length = value.trim().parse().unwrap_or(0);
            }
        }
    }

    let mut body = vec![0; content_length];
    reader.read_exact(&mut body).ok()?;
    Some(request_line.trim_end().to_string())
}

fn write_response(mut stream: TcpStream, status: u16, body: &str) {
    let response = format!(
        "HTTP/1.1 {status} Stub\r\n\
         Content-Type: application/json\r\n\
         Content-Length: {}\r\n\
         Connection: close\r\n\r\n{body}",
        body.len(),
    );
    let _ = stream.write_all(response.as_bytes());
}

/// URL on a loopback port nothing is listening on
pub fn unreachable_url() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind free port");
    let addr = listener.local_addr().expect("local addr");
    drop(listener);
    format!("http://{}/api/interpreter", addr)
}
