//! Shared fixtures for the daemon test suites.

use std::io::{Read, Write};
use std::net::{SocketAddr, TcpStream};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::{Duration, Instant};

use serde_json::json;

use davenport_config::ServerOptions;

use crate::dispatch::{DavMethod, RequestContext, RequestHook};
use crate::persist::TreeSource;
use crate::server::DavServer;

/// A started server plus the ephemeral address it serves.
pub(crate) struct TestServer {
    pub(crate) server: DavServer,
    pub(crate) addr: SocketAddr,
}

impl TestServer {
    /// Builds and starts a server on an ephemeral port, letting the caller
    /// register handlers and hooks first.
    pub(crate) fn start<T: TreeSource + 'static>(
        options: ServerOptions,
        tree: Arc<T>,
        configure: impl FnOnce(&mut DavServer),
    ) -> Self {
        let mut server = DavServer::new(
            ServerOptions {
                port: 0,
                ..options
            },
            tree,
        );
        configure(&mut server);
        let addr = server.start().expect("start test server");
        Self { server, addr }
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        let _ = self.server.stop();
    }
}

/// Tree collaborator counting how many snapshots were taken.
pub(crate) struct CountingTree {
    saves: Mutex<usize>,
    value: serde_json::Value,
}

impl CountingTree {
    pub(crate) fn new(value: serde_json::Value) -> Self {
        Self {
            saves: Mutex::new(0),
            value,
        }
    }

    pub(crate) fn saves(&self) -> usize {
        *self.saves.lock().expect("saves lock")
    }
}

impl TreeSource for CountingTree {
    fn save(&self) -> Result<serde_json::Value, Box<dyn std::error::Error + Send + Sync>> {
        *self.saves.lock().expect("saves lock") += 1;
        Ok(self.value.clone())
    }
}

/// Tree collaborator that always snapshots an empty object.
pub(crate) struct NullTree;

impl TreeSource for NullTree {
    fn save(&self) -> Result<serde_json::Value, Box<dyn std::error::Error + Send + Sync>> {
        Ok(json!({}))
    }
}

/// Hook that appends a label to a shared log.
pub(crate) struct LabelHook {
    pub(crate) label: &'static str,
    pub(crate) log: Arc<Mutex<Vec<String>>>,
}

impl RequestHook for LabelHook {
    fn run(&self, _ctx: &mut RequestContext) {
        self.log.lock().expect("hook log lock").push(self.label.to_owned());
    }
}

/// Handler recording the buffered body and answering a fixed status.
pub(crate) struct RecordingMethod {
    pub(crate) status: u16,
    pub(crate) log: Arc<Mutex<Vec<String>>>,
    pub(crate) bodies: Arc<Mutex<Vec<Vec<u8>>>>,
}

impl DavMethod for RecordingMethod {
    fn invoke(&self, ctx: &mut RequestContext) {
        self.log.lock().expect("hook log lock").push("handler".to_owned());
        self.bodies
            .lock()
            .expect("bodies lock")
            .push(ctx.body().to_vec());
        ctx.response_mut().set_status(self.status);
    }
}

/// Chunk-capable handler that drains the live stream itself.
pub(crate) struct StreamingMethod {
    pub(crate) bodies: Arc<Mutex<Vec<Vec<u8>>>>,
}

impl DavMethod for StreamingMethod {
    fn invoke(&self, ctx: &mut RequestContext) {
        // Only reached when chunked dispatch is disabled server-side.
        ctx.response_mut().set_status(500);
    }

    fn supports_chunked(&self) -> bool {
        true
    }

    fn invoke_chunked(&self, ctx: &mut RequestContext, body: &mut dyn Read) {
        let mut drained = Vec::new();
        body.read_to_end(&mut drained).expect("drain body stream");
        self.bodies.lock().expect("bodies lock").push(drained);
        ctx.response_mut().set_status(200);
    }
}

/// Sends raw bytes and collects the full response until the server closes.
pub(crate) fn send_request(addr: SocketAddr, request: &[u8]) -> String {
    send_fragments(addr, &[request], Duration::ZERO)
}

/// Sends the request in fragments with a pause between them.
pub(crate) fn send_fragments(addr: SocketAddr, fragments: &[&[u8]], pause: Duration) -> String {
    let mut stream = TcpStream::connect(addr).expect("connect test client");
    stream
        .set_read_timeout(Some(Duration::from_secs(5)))
        .expect("set read timeout");
    for (index, fragment) in fragments.iter().enumerate() {
        if index > 0 && !pause.is_zero() {
            thread::sleep(pause);
        }
        stream.write_all(fragment).expect("write fragment");
        stream.flush().expect("flush fragment");
    }
    let mut response = String::new();
    stream
        .read_to_string(&mut response)
        .expect("read response to close");
    response
}

/// Polls `predicate` until it holds or the deadline passes.
pub(crate) fn wait_for(predicate: impl Fn() -> bool) -> bool {
    let deadline = Instant::now() + Duration::from_secs(5);
    while Instant::now() < deadline {
        if predicate() {
            return true;
        }
        thread::sleep(Duration::from_millis(10));
    }
    false
}
