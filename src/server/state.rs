use std::path::PathBuf;

use crate::barcode::Scanner;

pub struct ServerState {
    pub scanner: Scanner,
    pub upload_dir: PathBuf,
}
