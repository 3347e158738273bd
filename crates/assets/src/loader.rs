use std::path::{Path, PathBuf};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender, TryRecvError};
use std::thread;
use std::time::Duration;

use crate::loading::{LoadingManager, Notice, Progress};
use crate::model::ModelAsset;
use crate::texture::TextureAsset;
use crate::AssetError;

/// Event delivered to the caller of [`AssetLoader::poll`].
#[derive(Debug)]
pub enum LoadEvent {
    Progress(Progress),
    Model(ModelAsset),
    Texture(TextureAsset),
    /// A fetch failed. It still counts as ended; nothing is retried.
    Failed { url: String, reason: String },
    /// Every fetch issued so far has ended. Delivered at most once.
    AllLoaded,
}

enum Fetched {
    Model(Result<ModelAsset, AssetError>),
    Texture(Result<TextureAsset, AssetError>),
}

/// Issues model and texture fetches on worker threads and reports results
/// back to a single owner through [`poll`](Self::poll).
///
/// Workers only read and decode files. All bookkeeping happens on the thread
/// that polls, so the owner never shares state with a worker.
pub struct AssetLoader {
    manager: LoadingManager,
    decoder_path: PathBuf,
    sender: Sender<(String, Fetched)>,
    receiver: Receiver<(String, Fetched)>,
    queued: Vec<LoadEvent>,
}

impl AssetLoader {
    pub fn new(decoder_path: impl Into<PathBuf>) -> Self {
        let (sender, receiver) = mpsc::channel();
        Self {
            manager: LoadingManager::new(),
            decoder_path: decoder_path.into(),
            sender,
            receiver,
            queued: Vec::new(),
        }
    }

    pub fn decoder_path(&self) -> &Path {
        &self.decoder_path
    }

    pub fn manager(&self) -> &LoadingManager {
        &self.manager
    }

    pub fn load_model(&mut self, path: impl AsRef<Path>) {
        let path = path.as_ref().to_path_buf();
        let decoder = self.decoder_path.clone();
        self.spawn(path, move |p| Fetched::Model(ModelAsset::open(p, &decoder)));
    }

    pub fn load_texture(&mut self, path: impl AsRef<Path>) {
        let path = path.as_ref().to_path_buf();
        self.spawn(path, |p| Fetched::Texture(TextureAsset::open(p)));
    }

    /// Drain every finished fetch without blocking.
    pub fn poll(&mut self) -> Vec<LoadEvent> {
        loop {
            match self.receiver.try_recv() {
                Ok((url, fetched)) => self.finish(url, fetched),
                Err(TryRecvError::Empty) => break,
                // The loader holds a sender, so the channel never disconnects.
                Err(TryRecvError::Disconnected) => break,
            }
        }
        std::mem::take(&mut self.queued)
    }

    /// Like [`poll`](Self::poll) but waits up to `timeout` for the next fetch
    /// when none has finished yet.
    pub fn poll_wait(&mut self, timeout: Duration) -> Vec<LoadEvent> {
        if self.queued.is_empty() {
            match self.receiver.recv_timeout(timeout) {
                Ok((url, fetched)) => self.finish(url, fetched),
                Err(RecvTimeoutError::Timeout | RecvTimeoutError::Disconnected) => {}
            }
        }
        self.poll()
    }

    fn spawn<F>(&mut self, path: PathBuf, fetch: F)
    where
        F: FnOnce(&Path) -> Fetched + Send + 'static,
    {
        let url = path.display().to_string();
        let notice = self.manager.item_start(&url);
        self.push_notice(notice);

        let sender = self.sender.clone();
        thread::spawn(move || {
            let fetched = fetch(&path);
            let _ = sender.send((url, fetched));
        });
    }

    fn finish(&mut self, url: String, fetched: Fetched) {
        let outcome = match fetched {
            Fetched::Model(Ok(model)) => Ok(LoadEvent::Model(model)),
            Fetched::Texture(Ok(texture)) => Ok(LoadEvent::Texture(texture)),
            Fetched::Model(Err(e)) | Fetched::Texture(Err(e)) => Err(e),
        };
        let notices = match outcome {
            Ok(event) => {
                self.queued.push(event);
                self.manager.item_end(&url)
            }
            Err(e) => {
                let reason = e.to_string();
                let notices = self.manager.item_error(&url, &reason);
                self.queued.push(LoadEvent::Failed { url, reason });
                notices
            }
        };
        for notice in notices {
            self.push_notice(notice);
        }
    }

    fn push_notice(&mut self, notice: Notice) {
        self.queued.push(match notice {
            Notice::Progress(p) => LoadEvent::Progress(p),
            Notice::AllLoaded => LoadEvent::AllLoaded,
        });
    }
}
