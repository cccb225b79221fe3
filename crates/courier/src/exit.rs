use courier_transfer::{DownloadError, ErrorClass, Interrupt, TransferError};

pub const FAILURE: u8 = 1;
pub const FILESYSTEM_SAFETY: u8 = 2;
pub const HTTP_STATUS: u8 = 3;
pub const NETWORK: u8 = 4;
pub const CANCELLED: u8 = 5;
pub const REMOTE_FAILED: u8 = 6;

/// Exit status for a failed command, from the first classified error in the chain.
pub fn code_for(err: &anyhow::Error) -> u8 {
    err.chain().find_map(classify).map_or(FAILURE, code_for_class)
}

fn classify(err: &(dyn std::error::Error + 'static)) -> Option<ErrorClass> {
    if let Some(err) = err.downcast_ref::<DownloadError>() {
        return Some(err.class());
    }
    if let Some(err) = err.downcast_ref::<TransferError>() {
        return Some(err.class());
    }
    if err.is::<Interrupt>() {
        return Some(ErrorClass::Cancellation);
    }
    err.downcast_ref::<courier_fs::Error>()
        .filter(|err| err.is_safety_violation())
        .map(|_| ErrorClass::FilesystemSafety)
}

fn code_for_class(class: ErrorClass) -> u8 {
    match class {
        ErrorClass::FilesystemSafety => FILESYSTEM_SAFETY,
        ErrorClass::HttpStatus => HTTP_STATUS,
        ErrorClass::TransientNetwork => NETWORK,
        ErrorClass::Cancellation => CANCELLED,
        ErrorClass::RemoteProcessingFailed => REMOTE_FAILED,
        ErrorClass::Other => FAILURE,
    }
}
