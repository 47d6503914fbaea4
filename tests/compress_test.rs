#![cfg(unix)]

use std::cell::RefCell;
use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

use tempfile::TempDir;

use pdfebc::compress::{FILE_SIZE_LOWER_LIMIT, GS_ARGS, compress_many, compress_one};
use pdfebc::errors::PdfebcError;
use pdfebc::scanner::list_pdf_paths;

// Executing a freshly written script while another test thread forks can
// fail with ETXTBSY, so tests that spawn the fake tool run one at a time.
static SPAWN_LOCK: Mutex<()> = Mutex::new(());

fn serial() -> MutexGuard<'static, ()> {
    let _ = env_logger::builder().is_test(true).try_init();
    SPAWN_LOCK.lock().unwrap_or_else(|e| e.into_inner())
}

/// Stand-in for Ghostscript: records its arguments in `calls.log` and
/// copies the input to the `-sOutputFile=` path.
struct FakeGs {
    script: PathBuf,
    log: PathBuf,
}

impl FakeGs {
    fn new(dir: &Path) -> Self {
        let log = dir.join("calls.log");
        let body = format!(
            "#!/bin/sh\n\
             printf '%s\\n' \"$*\" >> '{}'\n\
             out=\n\
             src=\n\
             for arg in \"$@\"; do\n\
             \x20 case \"$arg\" in\n\
             \x20   -sOutputFile=*) out=\"${{arg#-sOutputFile=}}\" ;;\n\
             \x20 esac\n\
             \x20 src=\"$arg\"\n\
             done\n\
             cp \"$src\" \"$out\"\n",
            log.display()
        );
        Self::write(dir, body, log)
    }

    fn failing(dir: &Path) -> Self {
        let log = dir.join("calls.log");
        let body = format!("#!/bin/sh\nprintf '%s\\n' \"$*\" >> '{}'\necho boom >&2\nexit 3\n", log.display());
        Self::write(dir, body, log)
    }

    fn write(dir: &Path, body: String, log: PathBuf) -> Self {
        let script = dir.join("fake-gs");
        fs::write(&script, body).unwrap();
        fs::set_permissions(&script, fs::Permissions::from_mode(0o755)).unwrap();
        FakeGs { script, log }
    }

    fn binary(&self) -> &str {
        self.script.to_str().unwrap()
    }

    fn calls(&self) -> Vec<String> {
        match fs::read_to_string(&self.log) {
            Ok(s) => s.lines().map(str::to_string).collect(),
            Err(_) => Vec::new(),
        }
    }
}

fn write_file(path: &Path, size: u64) {
    let data: Vec<u8> = (0..size).map(|i| (i % 251) as u8).collect();
    fs::write(path, data).unwrap();
}

    #[test]
    fn test_small_file_is_copied() {
        let _guard = serial();
        let tools = TempDir::new().unwrap();
        let gs = FakeGs::new(tools.path());
        let tmp = TempDir::new().unwrap();
        let src = tmp.path().join("small.pdf");
        let dst = tmp.path().join("small_out.pdf");
        write_file(&src, FILE_SIZE_LOWER_LIMIT - 1);

        let seen = RefCell::new(Vec::new());
        let sink = |m: &str| seen.borrow_mut().push(m.to_string());
        compress_one(&src, &dst, gs.binary(), &sink).unwrap();

        assert_eq!(fs::read(&src).unwrap(), fs::read(&dst).unwrap());
        assert!(gs.calls().is_empty());
        let seen = seen.into_inner();
        assert_eq!(seen.len(), 2);
        assert!(seen[0].starts_with("Not compressing"));
        assert!(seen[0].contains(&format!("{} bytes", FILE_SIZE_LOWER_LIMIT - 1)));
        assert!(seen[0].contains(&format!("{} bytes", FILE_SIZE_LOWER_LIMIT)));
        assert!(seen[1].starts_with("File done!"));
        assert!(seen[1].contains(&dst.display().to_string()));
    }

    #[test]
    fn test_empty_file_is_copied() {
        let _guard = serial();
        let tools = TempDir::new().unwrap();
        let gs = FakeGs::new(tools.path());
        let tmp = TempDir::new().unwrap();
        let src = tmp.path().join("empty.pdf");
        let dst = tmp.path().join("empty_out.pdf");
        write_file(&src, 0);

        compress_one(&src, &dst, gs.binary(), &pdfebc::progress::Silent).unwrap();
        assert_eq!(fs::read(&dst).unwrap().len(), 0);
        assert!(gs.calls().is_empty());
    }

    #[test]
    fn test_large_file_runs_tool_once() {
        let _guard = serial();
        let tools = TempDir::new().unwrap();
        let gs = FakeGs::new(tools.path());
        let tmp = TempDir::new().unwrap();
        let src = tmp.path().join("large.pdf");
        let dst = tmp.path().join("large_out.pdf");
        write_file(&src, FILE_SIZE_LOWER_LIMIT);

        let seen = RefCell::new(Vec::new());
        let sink = |m: &str| seen.borrow_mut().push(m.to_string());
        compress_one(&src, &dst, gs.binary(), &sink).unwrap();

        let calls = gs.calls();
        assert_eq!(calls.len(), 1);
        for flag in GS_ARGS {
            assert!(calls[0].contains(flag), "missing {flag} in {}", calls[0]);
        }
        assert!(calls[0].contains(&format!("-sOutputFile={}", dst.display())));
        assert!(calls[0].ends_with(&src.display().to_string()));
        // the tool has finished writing by the time we return
        assert_eq!(fs::read(&dst).unwrap().len() as u64, FILE_SIZE_LOWER_LIMIT);

        let seen = seen.into_inner();
        assert_eq!(seen.len(), 2);
        assert!(seen[0].starts_with("Compressing"));
        assert!(seen[1].starts_with("File done!"));
    }

    #[test]
    fn test_failing_tool_is_command_failed() {
        let _guard = serial();
        let tools = TempDir::new().unwrap();
        let gs = FakeGs::failing(tools.path());
        let tmp = TempDir::new().unwrap();
        let src = tmp.path().join("large.pdf");
        write_file(&src, FILE_SIZE_LOWER_LIMIT + 10);

        let seen = RefCell::new(Vec::new());
        let sink = |m: &str| seen.borrow_mut().push(m.to_string());
        let err = compress_one(&src, tmp.path().join("out.pdf"), gs.binary(), &sink).unwrap_err();
        match err {
            PdfebcError::CommandFailed(msg) => assert!(msg.contains("boom")),
            other => panic!("unexpected error: {other}"),
        }
        assert_eq!(seen.into_inner().len(), 1);
    }

    #[test]
    fn test_missing_source_is_io_error() {
        let _guard = serial();
        let tools = TempDir::new().unwrap();
        let gs = FakeGs::new(tools.path());
        let tmp = TempDir::new().unwrap();
        let err = compress_one(tmp.path().join("ghost.pdf"), tmp.path().join("out.pdf"), gs.binary(), &pdfebc::progress::Silent)
            .unwrap_err();
        assert!(matches!(err, PdfebcError::Io(_)));
    }

    #[test]
    fn test_compress_many_mixed_directory() {
        let _guard = serial();
        let tools = TempDir::new().unwrap();
        let gs = FakeGs::new(tools.path());
        let src_dir = TempDir::new().unwrap();
        let out_dir = TempDir::new().unwrap();

        write_file(&src_dir.path().join("a.pdf"), 10);
        write_file(&src_dir.path().join("b.pdf"), FILE_SIZE_LOWER_LIMIT + 1);
        write_file(&src_dir.path().join("c.pdf"), 20);
        write_file(&src_dir.path().join("notes.txt"), 10);
        write_file(&src_dir.path().join("image.png"), 10);

        let seen = RefCell::new(Vec::new());
        let sink = |m: &str| seen.borrow_mut().push(m.to_string());
        let outputs = compress_many(src_dir.path(), out_dir.path(), gs.binary(), &sink).unwrap();

        let sources = list_pdf_paths(src_dir.path()).unwrap();
        assert_eq!(outputs.len(), 3);
        assert_eq!(outputs.len(), sources.len());
        for (source, output) in sources.iter().zip(&outputs) {
            assert_eq!(output.parent().unwrap(), out_dir.path());
            assert_eq!(output.file_name(), source.file_name());
            assert_eq!(fs::read(source).unwrap(), fs::read(output).unwrap());
        }
        assert_eq!(gs.calls().len(), 1);

        let seen = seen.into_inner();
        assert_eq!(seen.len(), 1 + 3 * 2 + 1);
        assert!(seen[0].contains(&format!("Source directory: '{}'", src_dir.path().display())));
        assert!(seen[0].contains(&format!("Output directory: '{}'", out_dir.path().display())));
        assert!(seen[0].contains("Found '3' PDF files"));
        assert!(seen[7].starts_with("All files done!"));
        assert!(seen[7].contains(&out_dir.path().display().to_string()));
    }

    #[test]
    fn test_compress_many_aborts_on_first_failure() {
        let _guard = serial();
        let tools = TempDir::new().unwrap();
        let gs = FakeGs::failing(tools.path());
        let src_dir = TempDir::new().unwrap();
        let out_dir = TempDir::new().unwrap();
        write_file(&src_dir.path().join("a.pdf"), FILE_SIZE_LOWER_LIMIT);
        write_file(&src_dir.path().join("b.pdf"), FILE_SIZE_LOWER_LIMIT);

        let err = compress_many(src_dir.path(), out_dir.path(), gs.binary(), &pdfebc::progress::Silent).unwrap_err();
        assert!(matches!(err, PdfebcError::CommandFailed(_)));
        assert_eq!(gs.calls().len(), 1);
    }

    #[test]
    fn test_compress_many_missing_tool_is_fatal() {
        let src_dir = TempDir::new().unwrap();
        let out_dir = TempDir::new().unwrap();
        write_file(&src_dir.path().join("a.pdf"), 10);

        let err = compress_many(src_dir.path(), out_dir.path(), "pdfebc-no-such-gs", &pdfebc::progress::Silent)
            .unwrap_err();
        assert!(matches!(err, PdfebcError::ToolNotFound(ref name) if name == "pdfebc-no-such-gs"));
        assert!(!out_dir.path().join("a.pdf").exists());
    }

    #[test]
    fn test_compress_many_into_source_dir_keeps_sources() {
        let _guard = serial();
        let tools = TempDir::new().unwrap();
        let gs = FakeGs::new(tools.path());
        let dir = TempDir::new().unwrap();
        let src = dir.path().join("a.pdf");
        fs::write(&src, b"%PDF-1.4 precious").unwrap();

        let err = compress_many(dir.path(), dir.path(), gs.binary(), &pdfebc::progress::Silent).unwrap_err();
        assert!(matches!(err, PdfebcError::InvalidInput(_)));
        assert_eq!(fs::read(&src).unwrap(), b"%PDF-1.4 precious");
        assert!(gs.calls().is_empty());
    }

    #[test]
    fn test_large_file_onto_itself_is_rejected() {
        let _guard = serial();
        let tools = TempDir::new().unwrap();
        let gs = FakeGs::new(tools.path());
        let tmp = TempDir::new().unwrap();
        let src = tmp.path().join("large.pdf");
        write_file(&src, FILE_SIZE_LOWER_LIMIT);
        let alias = tmp.path().join(".").join("large.pdf");

        let err = compress_one(&src, &alias, gs.binary(), &pdfebc::progress::Silent).unwrap_err();
        assert!(matches!(err, PdfebcError::InvalidInput(_)));
        assert_eq!(fs::metadata(&src).unwrap().len(), FILE_SIZE_LOWER_LIMIT);
        assert!(gs.calls().is_empty());
    }
