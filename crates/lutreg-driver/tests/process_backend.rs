// SPDX-License-Identifier: AGPL-3.0-only

//! Process backend tests with stand-in shell scripts
//!
//! Every tool is replaced by a small `sh` script that logs its arguments and
//! produces the artifact the real tool would, so argument formatting, output
//! parsing and failure handling are checked without an FPGA.

#![cfg(unix)]

use lutreg_driver::fabric::{Lut, RegisterIndex, RegisterLocation};
use lutreg_driver::{
    ArtifactPaths, BitstreamTools, ConfigPort, ErrorKind, LutRegError, Operation, Outcome,
    ProcessBackend, ReconfigurationPipeline, RegisterLookup, Stage, Tool, ToolConfig,
};
use std::fs;
use std::path::PathBuf;
use tempfile::TempDir;

const LISTING: &str = "\
INIT values of SLICE_X10Y20
SLICE_X10Y20 A6LUT 0x0000000100000000
SLICE_X10Y20 B6LUT 0x0000000000000001
SLICE_X10Y20 C6LUT 0x0000000000000000
SLICE_X10Y20 D6LUT 0x0000000000000000
";

struct Harness {
    dir: TempDir,
    backend: ProcessBackend,
}

impl Harness {
    /// Every tool logs `<tool> <args>` to `calls.log` and succeeds
    fn new() -> Self {
        let dir = TempDir::new().expect("tempdir");
        let tools = dir.path().join("tools");
        fs::create_dir_all(tools.join("xilinx-devcfg")).expect("tools dir");

        let harness = Self {
            backend: ProcessBackend::new(
                ToolConfig::default()
                    .with_interpreter("sh")
                    .with_tools_dir(&tools),
            ),
            dir,
        };

        harness.script(
            Tool::Locator,
            "echo SLICE_X10Y20/A6LUT\necho\necho SLICE_X10Y20/B6LUT",
        );
        harness.script(Tool::Resolver, "echo 0x00420f00 0x00420f01");
        harness.script(
            Tool::DeviceConfig,
            "if [ \"$1\" = read ]; then echo frames > devcfg.out; fi",
        );
        harness.script(Tool::PartialAssembler, "cp \"$1\" \"$1.partial\"");
        harness.script(
            Tool::InitEditor,
            &format!("if [ \"$3\" = -r ]; then cat <<'EOF'\n{LISTING}EOF\nfi"),
        );
        harness.script(Tool::Packager, "cp \"$1\" \"$1.bin\"");
        harness
    }

    fn script(&self, tool: Tool, body: &str) {
        let log = self.dir.path().join("calls.log");
        let name = tool.default_script();
        let text = format!(
            "echo \"{name} $*\" >> '{}'\n{body}\n",
            log.display()
        );
        fs::write(self.backend.config().script(tool), text).expect("write script");
    }

    fn work_dir(&self) -> PathBuf {
        let work = self.dir.path().join("work");
        fs::create_dir_all(&work).expect("work dir");
        work
    }

    fn calls(&self) -> Vec<String> {
        fs::read_to_string(self.dir.path().join("calls.log"))
            .unwrap_or_default()
            .lines()
            .map(str::to_string)
            .collect()
    }
}

#[test]
fn test_locate_parses_lines() {
    let h = Harness::new();
    let locations = h.backend.locate("CTRL").expect("locate");

    assert_eq!(
        locations,
        vec![
            RegisterLocation::new("SLICE_X10Y20", Lut::A),
            RegisterLocation::new("SLICE_X10Y20", Lut::B),
        ]
    );
    assert_eq!(h.calls(), vec!["reg2loc.py CTRL"]);
}

#[test]
fn test_resolve_parses_hex_addresses() {
    let h = Harness::new();
    let frames = h
        .backend
        .frame_addresses(&RegisterLocation::new("SLICE_X10Y20", Lut::A))
        .expect("resolve");

    assert_eq!(frames, vec![0x0042_0f00, 0x0042_0f01]);
    assert_eq!(h.calls(), vec!["loc2addr.py SLICE_X10Y20/A6LUT"]);
}

#[test]
fn test_malformed_location_rejected() {
    let h = Harness::new();
    h.script(Tool::Locator, "echo SLICE_X10Y20");
    let err = h.backend.locate("CTRL").expect_err("malformed");
    assert!(matches!(err, LutRegError::InvalidLocation(_)), "{err}");
}

#[test]
fn test_unknown_lut_rejected() {
    let h = Harness::new();
    h.script(Tool::Locator, "echo SLICE_X10Y20/E6LUT");
    let err = h.backend.locate("CTRL").expect_err("unknown lut");
    assert!(matches!(err, LutRegError::UnknownLut { ref symbol } if symbol == "E6LUT"));
}

#[test]
fn test_bad_address_rejected() {
    let h = Harness::new();
    h.script(Tool::Resolver, "echo 0x1 zz");
    let err = h
        .backend
        .frame_addresses(&RegisterLocation::new("SLICE_X0Y0", Lut::A))
        .expect_err("bad address");
    assert_eq!(err.kind(), ErrorKind::ExternalTool);
}

#[test]
fn test_read_frames_arguments() {
    let h = Harness::new();
    let dump = h.work_dir().join("devcfg.out");
    h.backend.read_frames(0x0042_0f00, 2, &dump).expect("read frames");

    assert!(dump.is_file());
    assert_eq!(h.calls(), vec!["xilinx-devcfg/devcfg.py read 0x420f00 2"]);
}

#[test]
fn test_missing_artifact_detected() {
    let h = Harness::new();
    h.script(Tool::DeviceConfig, "true");
    let dump = h.work_dir().join("devcfg.out");

    let err = h.backend.read_frames(0x10, 1, &dump).expect_err("no dump");
    assert!(matches!(err, LutRegError::MissingArtifact { ref path, .. } if path == &dump));
}

#[test]
fn test_nonzero_exit_is_fatal() {
    let h = Harness::new();
    h.script(Tool::Packager, "echo 'CRC error' >&2\nexit 3");
    let partial = h.work_dir().join("devcfg.out.partial");
    let err = h
        .backend
        .pack(&partial, &partial.with_extension("partial.bin"))
        .expect_err("packager fails");

    match err {
        LutRegError::ExternalTool { tool, status } => {
            assert!(tool.ends_with("bit2bin.py"), "{tool}");
            assert!(status.contains('3'), "{status}");
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn test_missing_interpreter() {
    let dir = TempDir::new().expect("tempdir");
    let backend = ProcessBackend::new(
        ToolConfig::default()
            .with_interpreter(dir.path().join("no-such-interpreter"))
            .with_tools_dir(dir.path()),
    );
    let err = backend.locate("CTRL").expect_err("spawn fails");
    assert!(matches!(err, LutRegError::Spawn { .. }));
}

#[test]
fn test_patch_init_flags() {
    let h = Harness::new();
    let partial = h.work_dir().join("devcfg.out.partial");
    let flags = vec!["--nocrc".to_string(), "--b6lut=0x21".to_string()];
    h.backend
        .patch_init(&partial, "SLICE_X10Y20", &flags)
        .expect("patch");

    assert_eq!(
        h.calls(),
        vec![format!(
            "bitmod_init.py {} SLICE_X10Y20 --nocrc --b6lut=0x21",
            partial.display()
        )]
    );
}

#[test]
fn test_write_pipeline_end_to_end() {
    let h = Harness::new();
    let work = h.work_dir();
    let paths = ArtifactPaths::in_dir(&work);
    let pipeline = ReconfigurationPipeline::new(&h.backend, &h.backend, &h.backend, paths.clone());

    let index = RegisterIndex::new(0).expect("index");
    let outcome = pipeline
        .run("CTRL", index, Operation::Write(0x9))
        .expect("write");
    assert!(matches!(outcome, Outcome::Written(s) if s.slices_flushed == 1));

    let dump = paths.frame_dump.display();
    let partial = paths.partial.display();
    let image = paths.image.display();
    assert_eq!(
        h.calls(),
        vec![
            "reg2loc.py CTRL".to_string(),
            "loc2addr.py SLICE_X10Y20/A6LUT".to_string(),
            "xilinx-devcfg/devcfg.py read 0x420f00 2".to_string(),
            format!("gen_partial_bitstream.py {dump} 0x420f00 0x420f01"),
            format!("bitmod_init.py {partial} SLICE_X10Y20 -r"),
            format!(
                "bitmod_init.py {partial} SLICE_X10Y20 --nocrc --a6lut=0x1 --b6lut=0x100000000"
            ),
            format!("bit2bin.py {partial}"),
            format!("xilinx-devcfg/devcfg.py write {image}"),
        ]
    );
}

#[test]
fn test_read_pipeline_end_to_end() {
    let h = Harness::new();
    let pipeline = ReconfigurationPipeline::new(
        &h.backend,
        &h.backend,
        &h.backend,
        ArtifactPaths::in_dir(h.work_dir()),
    );

    let outcome = pipeline
        .run("CTRL", RegisterIndex::new(0).expect("index"), Operation::Read)
        .expect("read");
    assert_eq!(outcome, Outcome::Read(0x6));
    assert!(h.calls().iter().all(|c| !c.starts_with("bit2bin.py")));
}

#[test]
fn test_truncated_listing_fails_read() {
    let h = Harness::new();
    h.script(
        Tool::InitEditor,
        "echo 'INIT values of SLICE_X10Y20'\necho 'SLICE_X10Y20 A6LUT 0x0'",
    );
    let pipeline = ReconfigurationPipeline::new(
        &h.backend,
        &h.backend,
        &h.backend,
        ArtifactPaths::in_dir(h.work_dir()),
    );

    let err = pipeline
        .run("CTRL", RegisterIndex::new(3).expect("index"), Operation::Read)
        .expect_err("short listing");
    assert_eq!(err.stage(), Some(Stage::ReadRegister));
    assert!(matches!(err.root(), LutRegError::ToolOutput { .. }));
}
