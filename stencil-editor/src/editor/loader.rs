// Off-thread image decoding.
//
// Every load gets a ticket with a sequence number. The session only applies
// the completion whose ticket is the latest it issued, so when two loads
// race the last one requested wins and stale results are dropped.

use std::path::PathBuf;
use std::thread;

use image::RgbaImage;
use tokio::sync::oneshot;
use tokio::sync::oneshot::error::TryRecvError;
use tracing::{debug, warn};

use crate::editor::error::CompositeError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImageSource {
    /// Encoded bytes, e.g. from a file picker.
    Bytes(Vec<u8>),
    Path(PathBuf),
}

impl ImageSource {
    fn describe(&self) -> String {
        match self {
            ImageSource::Bytes(bytes) => format!("{} bytes", bytes.len()),
            ImageSource::Path(path) => path.display().to_string(),
        }
    }

    /// Decode synchronously into straight RGBA.
    pub fn decode(&self) -> Result<RgbaImage, CompositeError> {
        let decoded = match self {
            ImageSource::Bytes(bytes) => image::load_from_memory(bytes),
            ImageSource::Path(path) => image::open(path),
        };
        decoded
            .map(|img| img.to_rgba8())
            .map_err(|e| CompositeError::ImageLoad {
                reason: format!("{}: {e}", self.describe()),
            })
    }
}

/// Identifies one load request. Higher sequence numbers are newer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct LoadTicket(pub u64);

pub type LoadResult = Result<RgbaImage, CompositeError>;

/// Handle to an in-flight decode. Await it, poll it, or block on it.
#[derive(Debug)]
pub struct PendingImage {
    ticket: LoadTicket,
    receiver: oneshot::Receiver<LoadResult>,
}

impl PendingImage {
    pub fn ticket(&self) -> LoadTicket {
        self.ticket
    }

    pub async fn wait(self) -> (LoadTicket, LoadResult) {
        let result = self.receiver.await.unwrap_or(Err(CompositeError::LoadCancelled));
        (self.ticket, result)
    }

    /// Blocking wait. Must not be called from inside an async runtime.
    pub fn blocking_wait(self) -> (LoadTicket, LoadResult) {
        let result = self
            .receiver
            .blocking_recv()
            .unwrap_or(Err(CompositeError::LoadCancelled));
        (self.ticket, result)
    }

    /// Non-blocking poll: `None` while the decode is still running.
    pub fn try_take(&mut self) -> Option<LoadResult> {
        match self.receiver.try_recv() {
            Ok(result) => Some(result),
            Err(TryRecvError::Empty) => None,
            Err(TryRecvError::Closed) => Some(Err(CompositeError::LoadCancelled)),
        }
    }
}

/// Issues tickets and spawns decoder threads.
#[derive(Debug, Default)]
pub struct ImageLoader {
    latest: u64,
}

impl ImageLoader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Ticket of the most recent request, if any was made.
    pub fn latest(&self) -> Option<LoadTicket> {
        (self.latest > 0).then_some(LoadTicket(self.latest))
    }

    pub fn is_latest(&self, ticket: LoadTicket) -> bool {
        ticket.0 == self.latest
    }

    /// Start decoding `source` on a worker thread.
    pub fn load(&mut self, source: ImageSource) -> PendingImage {
        self.latest += 1;
        let ticket = LoadTicket(self.latest);
        let (sender, receiver) = oneshot::channel();
        debug!(ticket = ticket.0, source = %source.describe(), "image load started");

        let spawned = thread::Builder::new()
            .name(format!("image-decode-{}", ticket.0))
            .spawn(move || {
                let result = source.decode();
                if sender.send(result).is_err() {
                    debug!(ticket = ticket.0, "image load finished after its handle was dropped");
                }
            });

        if let Err(e) = spawned {
            // The sender moved into the closure and was dropped with it, so
            // the receiver reports Closed -> LoadCancelled.
            warn!(ticket = ticket.0, error = %e, "could not spawn decoder thread");
        }

        PendingImage { ticket, receiver }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{ImageFormat, Rgba};
    use std::io::Cursor;

    fn png_bytes(width: u32, height: u32, rgba: [u8; 4]) -> Vec<u8> {
        let img = RgbaImage::from_pixel(width, height, Rgba(rgba));
        let mut out = Cursor::new(Vec::new());
        img.write_to(&mut out, ImageFormat::Png).unwrap();
        out.into_inner()
    }

    #[test]
    fn test_decode_bytes() {
        let img = ImageSource::Bytes(png_bytes(3, 2, [1, 2, 3, 255])).decode().unwrap();
        assert_eq!(img.dimensions(), (3, 2));
        assert_eq!(img.get_pixel(2, 1).0, [1, 2, 3, 255]);
    }

    #[test]
    fn test_decode_garbage_fails() {
        let err = ImageSource::Bytes(b"not an image".to_vec()).decode().unwrap_err();
        assert!(matches!(err, CompositeError::ImageLoad { .. }));

        let err = ImageSource::Path(PathBuf::from("target/does-not-exist.png"))
            .decode()
            .unwrap_err();
        assert!(matches!(err, CompositeError::ImageLoad { .. }));
    }

    #[test]
    fn test_tickets_increase() {
        let mut loader = ImageLoader::new();
        assert_eq!(loader.latest(), None);
        let first = loader.load(ImageSource::Bytes(png_bytes(1, 1, [0, 0, 0, 255])));
        let second = loader.load(ImageSource::Bytes(png_bytes(1, 1, [0, 0, 0, 255])));
        assert!(second.ticket() > first.ticket());
        assert!(!loader.is_latest(first.ticket()));
        assert!(loader.is_latest(second.ticket()));
    }

    #[test]
    fn test_blocking_wait() {
        let mut loader = ImageLoader::new();
        let pending = loader.load(ImageSource::Bytes(png_bytes(4, 4, [9, 9, 9, 255])));
        let (ticket, result) = pending.blocking_wait();
        assert_eq!(ticket, LoadTicket(1));
        assert_eq!(result.unwrap().dimensions(), (4, 4));
    }

    #[tokio::test]
    async fn test_await_failure() {
        let mut loader = ImageLoader::new();
        let pending = loader.load(ImageSource::Bytes(vec![0xde, 0xad]));
        let (_, result) = pending.wait().await;
        assert!(matches!(result, Err(CompositeError::ImageLoad { .. })));
    }
}
