use std::{collections::HashMap, future::Future, pin::Pin, sync::Arc};

use base64::Engine as _;
use futures::{FutureExt as _, future::Shared};
use parking_lot::Mutex;
use tracing::{debug, trace};

use crate::{
    error::{MuraleError, MuraleResult},
    sniff::ImageFormat,
};

/// Base64 input chunk length: roughly 8 KB, rounded down to a multiple of 3
/// so no padding appears mid-stream and the chunks concatenate into one valid
/// base64 payload.
const ENCODE_CHUNK: usize = 8 * 1024 - (8 * 1024) % 3;

/// External byte-read capability. The engine core never touches the
/// filesystem directly.
pub trait ByteSource: Send + Sync + 'static {
    fn read(&self, path: &str) -> impl Future<Output = std::io::Result<Vec<u8>>> + Send;
}

/// Reads through `tokio::fs`.
#[derive(Clone, Copy, Debug, Default)]
pub struct FsByteSource;

impl ByteSource for FsByteSource {
    async fn read(&self, path: &str) -> std::io::Result<Vec<u8>> {
        tokio::fs::read(path).await
    }
}

/// Trims whitespace and strips the Windows long-path prefix. Coalescing and
/// dedupe keys use this form.
pub fn normalize_path(path: &str) -> String {
    let trimmed = path.trim();
    trimmed.strip_prefix(r"\\?\").unwrap_or(trimmed).to_string()
}

type SharedLoad = Shared<Pin<Box<dyn Future<Output = MuraleResult<String>> + Send>>>;

/// Loads image bytes and produces `data:` URLs, coalescing concurrent loads
/// of the same normalized path into a single in-flight read.
///
/// The in-flight map is not a cache: an entry is removed the instant its load
/// settles, so a later call re-reads fresh bytes instead of reusing output.
pub struct ImageLoader<B> {
    source: Arc<B>,
    inflight: Arc<Mutex<HashMap<String, SharedLoad>>>,
}

impl<B: ByteSource> ImageLoader<B> {
    pub fn new(source: B) -> Self {
        Self {
            source: Arc::new(source),
            inflight: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Number of loads currently in flight.
    pub fn inflight_len(&self) -> usize {
        self.inflight.lock().len()
    }

    /// Reads, validates and encodes the image at `path` as a `data:` URL.
    /// Concurrent calls for the same normalized path share one read.
    pub async fn load(&self, path: &str) -> MuraleResult<String> {
        let path = normalize_path(path);
        if path.is_empty() {
            return Err(MuraleError::path("empty wallpaper path"));
        }
        self.entry(path).await
    }

    /// Fire-and-forget warm-up: starts (or joins) the load for `path` without
    /// the caller awaiting it. Failures are logged and swallowed.
    pub fn prefetch(&self, path: &str) {
        let path = normalize_path(path);
        if path.is_empty() {
            return;
        }
        let fut = self.entry(path.clone());
        tokio::spawn(async move {
            if let Err(err) = fut.await {
                debug!(%path, error = %err, "prefetch failed");
            }
        });
    }

    /// Returns the shared future for `path`, creating it if no load is in
    /// flight. A hit returns the same future, never a fresh read.
    fn entry(&self, path: String) -> SharedLoad {
        let mut inflight = self.inflight.lock();
        if let Some(fut) = inflight.get(&path) {
            trace!(%path, "joining in-flight load");
            return fut.clone();
        }

        let source = Arc::clone(&self.source);
        let map = Arc::clone(&self.inflight);
        let key = path.clone();
        let fut: SharedLoad = async move {
            let result = read_and_encode(source.as_ref(), &key).await;
            // Remove on settle, success or failure: the next load for this
            // path must re-read instead of seeing this result.
            map.lock().remove(&key);
            result
        }
        .boxed()
        .shared();

        inflight.insert(path, fut.clone());
        fut
    }
}

async fn read_and_encode<B: ByteSource>(source: &B, path: &str) -> MuraleResult<String> {
    let bytes = source
        .read(path)
        .await
        .map_err(|err| MuraleError::io(path, &err))?;
    if bytes.is_empty() {
        return Err(MuraleError::path(format!("zero bytes read from '{path}'")));
    }

    let Some(format) = ImageFormat::sniff(&bytes) else {
        let hint = ImageFormat::from_extension(path)
            .map(|f| format!(" (extension suggests {})", f.mime()))
            .unwrap_or_default();
        return Err(MuraleError::format(format!(
            "unrecognized image header for '{path}'{hint}"
        )));
    };

    Ok(encode_data_url(format.mime(), &bytes))
}

/// Encodes as `data:<mime>;base64,<payload>`, feeding the encoder in fixed
/// chunks instead of one whole-buffer call.
fn encode_data_url(mime: &str, bytes: &[u8]) -> String {
    let mut payload = String::with_capacity(bytes.len().div_ceil(3) * 4);
    for chunk in bytes.chunks(ENCODE_CHUNK) {
        base64::engine::general_purpose::STANDARD.encode_string(chunk, &mut payload);
    }
    format!("data:{mime};base64,{payload}")
}
