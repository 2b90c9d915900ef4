use crate::error::{CldrError, Result};
use std::path::Path;
use std::process::Command;
use tracing::info;

/// Editor used when `$EDITOR` is unset.
pub const DEFAULT_EDITOR: &str = "vim";

/// Builds the argument list that opens `file` with the cursor at `line`/`column`.
///
/// Vim-family editors start in insert mode at the requested position; other
/// editors just get the file.
pub fn editor_command(editor: &str, file: &Path, line: usize, column: usize) -> Vec<String> {
    let mut args = vec![editor.to_string()];
    if editor.contains("vim") {
        args.push("+startinsert".to_string());
        args.push("-c".to_string());
        args.push(format!("call cursor({}, {})", line, column));
    }
    args.push(file.display().to_string());
    args
}

/// Opens the user's editor on `file` and waits for it to exit.
///
/// A non-zero exit status is an error.
pub fn open_editor(file: &Path, line: usize, column: usize) -> Result<()> {
    let editor = std::env::var("EDITOR").unwrap_or_else(|_| DEFAULT_EDITOR.to_string());
    let args = editor_command(&editor, file, line, column);
    info!("Opening editor so the bullet can be entered manually: {:?}", args);

    let status = Command::new(&args[0])
        .args(&args[1..])
        .status()
        .map_err(|e| CldrError::usage(format!("Failed to launch editor {}: {}", editor, e)))?;

    if !status.success() {
        return Err(CldrError::usage(format!(
            "Editor {} exited with code {}",
            editor,
            status.code().unwrap_or(-1)
        )));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vim_gets_cursor_position() {
        let args = editor_command("nvim", Path::new("changelog/me@main.md"), 3, 10);
        assert_eq!(
            args,
            vec![
                "nvim",
                "+startinsert",
                "-c",
                "call cursor(3, 10)",
                "changelog/me@main.md"
            ]
        );
    }

    #[test]
    fn test_other_editors_get_only_the_file() {
        let args = editor_command("nano", Path::new("a.md"), 1, 1);
        assert_eq!(args, vec!["nano", "a.md"]);
    }
}
