use std::fs;
use std::path::Path;

use serde::Deserialize;
use structopt::StructOpt;

use lineflush::cliopt::CliOpt;
use lineflush::runner::Runner;
use lineflush::SharedBuffer;

#[derive(Debug, Deserialize)]
struct Case {
    args: Vec<String>,
    #[serde(default)]
    sink_writes: Option<usize>,
}

#[test]
fn e2e() -> Result<(), Box<dyn std::error::Error>> {
    let root_test_dir = Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("scenarios");

    for test_dir in fs::read_dir(&root_test_dir)? {
        let test_dir = test_dir?.path();

        if let Ok(filter) = std::env::var("E2E_CASE") {
            if !test_dir.as_os_str().to_string_lossy().ends_with(&filter) {
                continue;
            }
        }

        let case: Case = serde_json::from_str(&fs::read_to_string(test_dir.join("case.json"))?)?;
        let sink = run(&test_dir, &case.args)?;

        let expected_output = fs::read(test_dir.join("output"))?;
        let actual_output = sink.contents();

        assert_eq!(
            sorted_lines(&expected_output),
            sorted_lines(&actual_output),
            "\nUnexpected output in '{}'.\nExpected:\n{}\nActual:\n{}",
            test_dir.display(),
            String::from_utf8_lossy(&expected_output),
            String::from_utf8_lossy(&actual_output),
        );

        assert!(
            sink.writes()[..sink.writes().len().saturating_sub(1)]
                .iter()
                .all(|w| w.ends_with(b"\n")),
            "torn line in '{}'",
            test_dir.display(),
        );

        if let Some(expected_writes) = case.sink_writes {
            assert_eq!(
                expected_writes,
                sink.writes().len(),
                "unexpected number of sink writes in '{}'",
                test_dir.display(),
            );
        }
    }

    Ok(())
}

fn run(test_dir: &Path, cli_args: &[String]) -> Result<SharedBuffer, Box<dyn std::error::Error>> {
    let args = std::iter::once("lineflush".to_owned()).chain(cli_args.iter().cloned());
    let mut opt = CliOpt::from_iter_safe(args)?;
    opt.inputs = opt.inputs.iter().map(|p| test_dir.join(p)).collect();

    let sink = SharedBuffer::new();
    Runner::from_opt(&opt).run(|| sink.clone())?;

    assert_eq!(opt.inputs.len(), sink.close_count());
    Ok(sink)
}

// Inputs are pumped concurrently, so only the set of lines is deterministic.
fn sorted_lines(buf: &[u8]) -> Vec<Vec<u8>> {
    let mut lines: Vec<_> = buf.split_inclusive(|&b| b == b'\n').map(Vec::from).collect();
    lines.sort();
    lines
}
