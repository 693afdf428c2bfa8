//! File and folder actions.
//!
//! Text content is treated as UTF-8 throughout; reads tolerate invalid byte
//! sequences via lossy conversion rather than failing the step.

use std::fs;
use std::io::Write as _;
use std::path::{Path, PathBuf};

use anyhow::Result;
use flowdeck_engine::{Action, ActionRegistry, ExecutionContext, bool_param, string_param, string_param_or};
use flowdeck_types::{ActionResult, ActionSpec, ParamKind, ParamSpec};
use serde_json::{Map, Value, json};

const CATEGORY: &str = "file";

/// Registers the ten `file.*` actions.
pub fn register(registry: &mut ActionRegistry) -> Result<()> {
    registry.register(Box::new(CreateFolder))?;
    registry.register(Box::new(DeleteFolder))?;
    registry.register(Box::new(CopyFile))?;
    registry.register(Box::new(MoveFile))?;
    registry.register(Box::new(DeleteFile))?;
    registry.register(Box::new(RenameFile))?;
    registry.register(Box::new(ListFiles))?;
    registry.register(Box::new(ReadText))?;
    registry.register(Box::new(WriteText))?;
    registry.register(Box::new(AppendText))?;
    Ok(())
}

fn failure_from(error: impl std::fmt::Display) -> ActionResult {
    ActionResult::failure(error.to_string())
}

/// Destination directories accept a source file by name, matching common
/// copy/move semantics.
fn resolve_into_dir(src: &str, dst: &str) -> PathBuf {
    let dst_path = Path::new(dst);
    if dst_path.is_dir()
        && let Some(file_name) = Path::new(src).file_name()
    {
        return dst_path.join(file_name);
    }
    dst_path.to_path_buf()
}

struct CreateFolder;

impl Action for CreateFolder {
    fn spec(&self) -> ActionSpec {
        ActionSpec::new("file.create_folder", "Create folder", "Creates a folder, including missing parents.", CATEGORY)
            .param(ParamSpec::new("path", "Folder path", ParamKind::String).required())
            .param(
                ParamSpec::new("exist_ok", "Tolerate existing folder", ParamKind::Bool)
                    .with_default(true)
                    .describe("Succeed even if the folder already exists"),
            )
    }

    fn execute(&self, params: &Map<String, Value>, _context: &mut ExecutionContext) -> ActionResult {
        let path = string_param(params, "path").trim().to_string();
        let exist_ok = bool_param(params, "exist_ok", true);
        if path.is_empty() {
            return ActionResult::failure("no path given");
        }
        if !exist_ok && Path::new(&path).exists() {
            return ActionResult::failure(format!("folder already exists: {path}"));
        }
        match fs::create_dir_all(&path) {
            Ok(()) => ActionResult::success(format!("created folder: {path}")),
            Err(error) => failure_from(error),
        }
    }
}

struct DeleteFolder;

impl Action for DeleteFolder {
    fn spec(&self) -> ActionSpec {
        ActionSpec::new("file.delete_folder", "Delete folder", "Deletes a folder and everything inside it.", CATEGORY)
            .param(ParamSpec::new("path", "Folder path", ParamKind::String).required())
            .param(
                ParamSpec::new("ignore_errors", "Ignore errors", ParamKind::Bool)
                    .with_default(false)
                    .describe("Report success even when deletion fails"),
            )
    }

    fn execute(&self, params: &Map<String, Value>, _context: &mut ExecutionContext) -> ActionResult {
        let path = string_param(params, "path").trim().to_string();
        let ignore_errors = bool_param(params, "ignore_errors", false);
        if path.is_empty() {
            return ActionResult::failure("no path given");
        }
        match fs::remove_dir_all(&path) {
            Ok(()) => ActionResult::success(format!("deleted folder: {path}")),
            Err(_) if ignore_errors => ActionResult::success(format!("deleted folder (errors ignored): {path}")),
            Err(error) => failure_from(error),
        }
    }
}

struct CopyFile;

impl Action for CopyFile {
    fn spec(&self) -> ActionSpec {
        ActionSpec::new("file.copy", "Copy file", "Copies a file to a path or into a folder.", CATEGORY)
            .param(ParamSpec::new("src", "Source path", ParamKind::String).required())
            .param(ParamSpec::new("dst", "Destination path", ParamKind::String).required())
    }

    fn execute(&self, params: &Map<String, Value>, _context: &mut ExecutionContext) -> ActionResult {
        let src = string_param(params, "src").trim().to_string();
        let dst = string_param(params, "dst").trim().to_string();
        if src.is_empty() || dst.is_empty() {
            return ActionResult::failure("source or destination missing");
        }
        let target = resolve_into_dir(&src, &dst);
        match fs::copy(&src, &target) {
            Ok(_) => ActionResult::success(format!("copied: {src} -> {dst}")),
            Err(error) => failure_from(error),
        }
    }
}

struct MoveFile;

impl Action for MoveFile {
    fn spec(&self) -> ActionSpec {
        ActionSpec::new("file.move", "Move file", "Moves a file to a path or into a folder.", CATEGORY)
            .param(ParamSpec::new("src", "Source path", ParamKind::String).required())
            .param(ParamSpec::new("dst", "Destination path", ParamKind::String).required())
    }

    fn execute(&self, params: &Map<String, Value>, _context: &mut ExecutionContext) -> ActionResult {
        let src = string_param(params, "src").trim().to_string();
        let dst = string_param(params, "dst").trim().to_string();
        if src.is_empty() || dst.is_empty() {
            return ActionResult::failure("source or destination missing");
        }
        let target = resolve_into_dir(&src, &dst);
        // rename fails across filesystems; fall back to copy-then-delete
        let moved = fs::rename(&src, &target).or_else(|_| fs::copy(&src, &target).and_then(|_| fs::remove_file(&src)));
        match moved {
            Ok(_) => ActionResult::success(format!("moved: {src} -> {dst}")),
            Err(error) => failure_from(error),
        }
    }
}

struct DeleteFile;

impl Action for DeleteFile {
    fn spec(&self) -> ActionSpec {
        ActionSpec::new("file.delete", "Delete file", "Deletes a single file.", CATEGORY)
            .param(ParamSpec::new("path", "File path", ParamKind::String).required())
            .param(
                ParamSpec::new("missing_ok", "Tolerate missing file", ParamKind::Bool)
                    .with_default(false)
                    .describe("Succeed even if the file does not exist"),
            )
    }

    fn execute(&self, params: &Map<String, Value>, _context: &mut ExecutionContext) -> ActionResult {
        let path = string_param(params, "path").trim().to_string();
        let missing_ok = bool_param(params, "missing_ok", false);
        if path.is_empty() {
            return ActionResult::failure("no path given");
        }
        if !Path::new(&path).exists() {
            return if missing_ok {
                ActionResult::success(format!("file absent, nothing to delete: {path}"))
            } else {
                ActionResult::failure(format!("file does not exist: {path}"))
            };
        }
        match fs::remove_file(&path) {
            Ok(()) => ActionResult::success(format!("deleted: {path}")),
            Err(error) => failure_from(error),
        }
    }
}

struct RenameFile;

impl Action for RenameFile {
    fn spec(&self) -> ActionSpec {
        ActionSpec::new("file.rename", "Rename", "Renames a file or folder.", CATEGORY)
            .param(ParamSpec::new("src", "Current path", ParamKind::String).required())
            .param(ParamSpec::new("dst", "New path", ParamKind::String).required())
    }

    fn execute(&self, params: &Map<String, Value>, _context: &mut ExecutionContext) -> ActionResult {
        let src = string_param(params, "src").trim().to_string();
        let dst = string_param(params, "dst").trim().to_string();
        if src.is_empty() || dst.is_empty() {
            return ActionResult::failure("current or new path missing");
        }
        match fs::rename(&src, &dst) {
            Ok(()) => ActionResult::success(format!("renamed: {src} -> {dst}")),
            Err(error) => failure_from(error),
        }
    }
}

struct ListFiles;

impl Action for ListFiles {
    fn spec(&self) -> ActionSpec {
        ActionSpec::new("file.list", "List files", "Collects matching files into a variable.", CATEGORY)
            .param(ParamSpec::new("folder", "Folder path", ParamKind::String).required())
            .param(
                ParamSpec::new("pattern", "File pattern", ParamKind::String)
                    .with_default("*")
                    .describe("Glob pattern matched against file names, e.g. *.txt"),
            )
            .param(
                ParamSpec::new("var_name", "Variable name", ParamKind::String)
                    .with_default("file_list")
                    .describe("Variable receiving the newline-joined list"),
            )
            .param(
                ParamSpec::new("recursive", "Include subfolders", ParamKind::Bool)
                    .with_default(false),
            )
    }

    fn execute(&self, params: &Map<String, Value>, context: &mut ExecutionContext) -> ActionResult {
        let folder = string_param(params, "folder").trim().to_string();
        let pattern = string_param_or(params, "pattern", "*");
        let var_name = string_param_or(params, "var_name", "file_list");
        let recursive = bool_param(params, "recursive", false);
        if folder.is_empty() {
            return ActionResult::failure("no folder given");
        }

        let search = if recursive {
            Path::new(&folder).join("**").join(&pattern)
        } else {
            Path::new(&folder).join(&pattern)
        };
        let paths = match glob::glob(&search.to_string_lossy()) {
            Ok(paths) => paths,
            Err(error) => return failure_from(error),
        };
        let files: Vec<String> = paths
            .filter_map(|entry| entry.ok())
            .map(|path| path.to_string_lossy().into_owned())
            .collect();

        context.set_variable(var_name.clone(), files.join("\n"));
        context.set_variable(format!("{var_name}_count"), files.len().to_string());

        let mut data = Map::new();
        data.insert("files".into(), json!(files));
        data.insert("count".into(), json!(files.len()));
        ActionResult::success(format!("listed {} files", files.len())).with_data(data)
    }
}

struct ReadText;

impl Action for ReadText {
    fn spec(&self) -> ActionSpec {
        ActionSpec::new("file.read_text", "Read text file", "Reads a text file into a variable.", CATEGORY)
            .param(ParamSpec::new("path", "File path", ParamKind::String).required())
            .param(
                ParamSpec::new("var_name", "Variable name", ParamKind::String)
                    .with_default("file_content")
                    .describe("Variable receiving the file content"),
            )
    }

    fn execute(&self, params: &Map<String, Value>, context: &mut ExecutionContext) -> ActionResult {
        let path = string_param(params, "path").trim().to_string();
        let var_name = string_param_or(params, "var_name", "file_content");
        if path.is_empty() {
            return ActionResult::failure("no file path given");
        }
        let content = match fs::read(&path) {
            Ok(bytes) => String::from_utf8_lossy(&bytes).into_owned(),
            Err(error) => return failure_from(error),
        };
        let chars = content.chars().count();
        context.set_variable(var_name, content.clone());
        let mut data = Map::new();
        data.insert("content".into(), Value::String(content));
        ActionResult::success(format!("read file: {path} ({chars} chars)")).with_data(data)
    }
}

struct WriteText;

impl Action for WriteText {
    fn spec(&self) -> ActionSpec {
        ActionSpec::new("file.write_text", "Write text file", "Overwrites a text file, creating missing parent folders.", CATEGORY)
            .param(ParamSpec::new("path", "File path", ParamKind::String).required())
            .param(ParamSpec::new("content", "Content", ParamKind::Multiline).required())
    }

    fn execute(&self, params: &Map<String, Value>, _context: &mut ExecutionContext) -> ActionResult {
        let path = string_param(params, "path").trim().to_string();
        let content = string_param(params, "content");
        if path.is_empty() {
            return ActionResult::failure("no file path given");
        }
        if let Some(parent) = Path::new(&path).parent()
            && !parent.as_os_str().is_empty()
            && let Err(error) = fs::create_dir_all(parent)
        {
            return failure_from(error);
        }
        match fs::write(&path, &content) {
            Ok(()) => ActionResult::success(format!("wrote file: {path} ({} chars)", content.chars().count())),
            Err(error) => failure_from(error),
        }
    }
}

struct AppendText;

impl Action for AppendText {
    fn spec(&self) -> ActionSpec {
        ActionSpec::new("file.append_text", "Append text", "Appends to a text file, creating it when absent.", CATEGORY)
            .param(ParamSpec::new("path", "File path", ParamKind::String).required())
            .param(ParamSpec::new("content", "Content", ParamKind::Multiline).required())
            .param(
                ParamSpec::new("newline", "Newline before content", ParamKind::Bool)
                    .with_default(true)
                    .describe("Insert a newline before the appended content when the file is non-empty"),
            )
    }

    fn execute(&self, params: &Map<String, Value>, _context: &mut ExecutionContext) -> ActionResult {
        let path = string_param(params, "path").trim().to_string();
        let content = string_param(params, "content");
        let newline = bool_param(params, "newline", true);
        if path.is_empty() {
            return ActionResult::failure("no file path given");
        }
        if let Some(parent) = Path::new(&path).parent()
            && !parent.as_os_str().is_empty()
            && let Err(error) = fs::create_dir_all(parent)
        {
            return failure_from(error);
        }
        let non_empty = fs::metadata(&path).map(|meta| meta.len() > 0).unwrap_or(false);
        let appended = fs::OpenOptions::new().create(true).append(true).open(&path).and_then(|mut file| {
            if newline && non_empty {
                file.write_all(b"\n")?;
            }
            file.write_all(content.as_bytes())
        });
        match appended {
            Ok(()) => ActionResult::success(format!("appended to file: {path} ({} chars)", content.chars().count())),
            Err(error) => failure_from(error),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use flowdeck_types::ActionStatus;

    fn run(action: &dyn Action, params: Value) -> (ActionResult, ExecutionContext) {
        let mut context = ExecutionContext::new();
        let params = params.as_object().expect("object").clone();
        let result = action.execute(&params, &mut context);
        (result, context)
    }

    #[test]
    fn create_folder_respects_exist_ok() {
        let dir = tempfile::tempdir().expect("tempdir");
        let target = dir.path().join("a/b/c");
        let params = json!({"path": target.to_string_lossy()});

        let (result, _) = run(&CreateFolder, params.clone());
        assert_eq!(result.status, ActionStatus::Success);
        assert!(target.is_dir());

        // existing folder succeeds by default, fails with exist_ok=false
        let (result, _) = run(&CreateFolder, params.clone());
        assert_eq!(result.status, ActionStatus::Success);
        let mut strict = params.as_object().expect("object").clone();
        strict.insert("exist_ok".into(), json!(false));
        let (result, _) = run(&CreateFolder, Value::Object(strict));
        assert_eq!(result.status, ActionStatus::Failed);
    }

    #[test]
    fn delete_folder_ignore_errors_swallows_missing_path() {
        let dir = tempfile::tempdir().expect("tempdir");
        let missing = dir.path().join("gone");
        let (result, _) = run(&DeleteFolder, json!({"path": missing.to_string_lossy()}));
        assert_eq!(result.status, ActionStatus::Failed);
        let (result, _) = run(&DeleteFolder, json!({"path": missing.to_string_lossy(), "ignore_errors": true}));
        assert_eq!(result.status, ActionStatus::Success);
    }

    #[test]
    fn copy_into_directory_keeps_the_file_name() {
        let dir = tempfile::tempdir().expect("tempdir");
        let src = dir.path().join("report.txt");
        fs::write(&src, "data").expect("write src");
        let dst_dir = dir.path().join("out");
        fs::create_dir(&dst_dir).expect("mkdir");

        let (result, _) = run(&CopyFile, json!({"src": src.to_string_lossy(), "dst": dst_dir.to_string_lossy()}));
        assert_eq!(result.status, ActionStatus::Success);
        assert_eq!(fs::read_to_string(dst_dir.join("report.txt")).expect("read"), "data");
        assert!(src.exists());
    }

    #[test]
    fn move_removes_the_source() {
        let dir = tempfile::tempdir().expect("tempdir");
        let src = dir.path().join("a.txt");
        fs::write(&src, "x").expect("write");
        let dst = dir.path().join("b.txt");

        let (result, _) = run(&MoveFile, json!({"src": src.to_string_lossy(), "dst": dst.to_string_lossy()}));
        assert_eq!(result.status, ActionStatus::Success);
        assert!(!src.exists());
        assert!(dst.exists());
    }

    #[test]
    fn delete_missing_file_honors_missing_ok() {
        let dir = tempfile::tempdir().expect("tempdir");
        let missing = dir.path().join("none.txt");
        let (result, _) = run(&DeleteFile, json!({"path": missing.to_string_lossy()}));
        assert_eq!(result.status, ActionStatus::Failed);
        let (result, _) = run(&DeleteFile, json!({"path": missing.to_string_lossy(), "missing_ok": "true"}));
        assert_eq!(result.status, ActionStatus::Success);
    }

    #[test]
    fn list_files_binds_variables_and_data() {
        let dir = tempfile::tempdir().expect("tempdir");
        fs::write(dir.path().join("a.txt"), "").expect("write");
        fs::write(dir.path().join("b.txt"), "").expect("write");
        fs::write(dir.path().join("c.csv"), "").expect("write");

        let (result, context) = run(
            &ListFiles,
            json!({"folder": dir.path().to_string_lossy(), "pattern": "*.txt", "var_name": "txt"}),
        );
        assert_eq!(result.status, ActionStatus::Success);
        assert_eq!(result.data["count"], json!(2));
        assert_eq!(context.get_variable_string("txt_count", ""), "2");
        let listed = context.get_variable_string("txt", "");
        assert_eq!(listed.lines().count(), 2);
        assert!(listed.contains("a.txt"));
    }

    #[test]
    fn list_files_recursive_descends_subfolders() {
        let dir = tempfile::tempdir().expect("tempdir");
        fs::create_dir_all(dir.path().join("sub")).expect("mkdir");
        fs::write(dir.path().join("sub/deep.txt"), "").expect("write");

        let (result, _) = run(
            &ListFiles,
            json!({"folder": dir.path().to_string_lossy(), "pattern": "*.txt", "recursive": true}),
        );
        assert_eq!(result.data["count"], json!(1));
    }

    #[test]
    fn read_text_binds_the_content_variable() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("note.txt");
        fs::write(&path, "hello").expect("write");

        let (result, context) = run(&ReadText, json!({"path": path.to_string_lossy()}));
        assert_eq!(result.status, ActionStatus::Success);
        assert_eq!(result.data["content"], json!("hello"));
        assert_eq!(context.get_variable_string("file_content", ""), "hello");
    }

    #[test]
    fn write_text_creates_missing_parents() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("nested/dir/out.txt");
        let (result, _) = run(&WriteText, json!({"path": path.to_string_lossy(), "content": "body"}));
        assert_eq!(result.status, ActionStatus::Success);
        assert_eq!(fs::read_to_string(&path).expect("read"), "body");
    }

    #[test]
    fn append_text_inserts_newline_only_when_non_empty() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("log.txt");

        let (result, _) = run(&AppendText, json!({"path": path.to_string_lossy(), "content": "first"}));
        assert_eq!(result.status, ActionStatus::Success);
        assert_eq!(fs::read_to_string(&path).expect("read"), "first");

        let (_, _) = run(&AppendText, json!({"path": path.to_string_lossy(), "content": "second"}));
        assert_eq!(fs::read_to_string(&path).expect("read"), "first\nsecond");

        let (_, _) = run(&AppendText, json!({"path": path.to_string_lossy(), "content": "third", "newline": false}));
        assert_eq!(fs::read_to_string(&path).expect("read"), "first\nsecondthird");
    }
}
