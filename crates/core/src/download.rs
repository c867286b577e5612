use crate::error::DownloadError;

/// A file handed to the host for a client-side save.
#[derive(Clone, Debug, PartialEq)]
pub struct DownloadFile {
    pub file_name: String,
    pub mime: String,
    pub bytes: Vec<u8>,
}

/// Host side of a download: a temporary object reference, a save trigger,
/// and the release of that reference.
pub trait DownloadHost {
    type Handle;

    fn create_object_url(&mut self, file: &DownloadFile) -> Result<Self::Handle, DownloadError>;
    fn trigger(&mut self, handle: &Self::Handle, file_name: &str) -> Result<(), DownloadError>;
    fn revoke(&mut self, handle: Self::Handle);
}

/// Revokes its handle when dropped, whether or not the trigger succeeded.
struct ObjectUrl<'h, H: DownloadHost> {
    host: &'h mut H,
    handle: Option<H::Handle>,
}

impl<H: DownloadHost> ObjectUrl<'_, H> {
    fn trigger(&mut self, file_name: &str) -> Result<(), DownloadError> {
        match &self.handle {
            Some(handle) => self.host.trigger(handle, file_name),
            None => Err(DownloadError::Host("object url already released".into())),
        }
    }
}

impl<H: DownloadHost> Drop for ObjectUrl<'_, H> {
    fn drop(&mut self) {
        if let Some(handle) = self.handle.take() {
            self.host.revoke(handle);
        }
    }
}

/// Hand `file` to the host for saving. The temporary handle lives exactly
/// as long as this call.
pub fn save<H: DownloadHost>(host: &mut H, file: &DownloadFile) -> Result<(), DownloadError> {
    let handle = host.create_object_url(file)?;
    let mut url = ObjectUrl {
        host,
        handle: Some(handle),
    };
    url.trigger(&file.file_name)
}
