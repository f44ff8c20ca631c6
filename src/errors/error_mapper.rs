use stockview_core::{LoadError, SyncError, TransportError};

/// Map a failed run to user-friendly messages
/// Returns (title, message, details)
pub fn map_run_error(error: &anyhow::Error) -> (String, String, String) {
    if let Some(load) = error.chain().find_map(|e| e.downcast_ref::<LoadError>()) {
        return map_load_error(load);
    }
    if let Some(sync) = error.chain().find_map(|e| e.downcast_ref::<SyncError>()) {
        return map_sync_error(sync);
    }

    (
        "Error".to_string(),
        error.to_string(),
        error
            .chain()
            .skip(1)
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join("\n"),
    )
}

fn map_load_error(error: &LoadError) -> (String, String, String) {
    match error {
        LoadError::Io { path, source } if source.kind() == std::io::ErrorKind::NotFound => (
            "File Not Found".to_string(),
            "The file could not be found.".to_string(),
            format!("Path: {}\n\nPlease verify the file exists and you have permission to read it.", path),
        ),
        LoadError::Io { path, source } if source.kind() == std::io::ErrorKind::PermissionDenied => (
            "Permission Denied".to_string(),
            "Permission denied.".to_string(),
            format!("You don't have permission to read this file:\n{}", path),
        ),
        LoadError::Io { source, .. } => (
            "Error Loading File".to_string(),
            "Failed to read the file.".to_string(),
            source.to_string(),
        ),
        LoadError::Json { path, source } => (
            "Invalid File".to_string(),
            format!("'{}' is not a valid stock dataset or config.", path),
            source.to_string(),
        ),
    }
}

fn map_sync_error(error: &SyncError) -> (String, String, String) {
    match error {
        SyncError::Refetch { base_id, source } => {
            let message = match source {
                TransportError::Network(_) => "The stock query could not reach the server.",
                TransportError::Server(_) => "The server rejected the stock query.",
            };
            (
                "Query Failed".to_string(),
                message.to_string(),
                format!("Base: {}\n{}\n\nFilters and URL were left unchanged.", base_id, source),
            )
        }
    }
}
