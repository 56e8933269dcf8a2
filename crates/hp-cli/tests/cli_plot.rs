use std::path::PathBuf;
use std::process::{Command, Output};
use std::time::{SystemTime, UNIX_EPOCH};

fn bin_path() -> PathBuf {
    PathBuf::from(env!("CARGO_BIN_EXE_hepplot"))
}

fn tmp_dir(name: &str) -> PathBuf {
    let nanos = SystemTime::now().duration_since(UNIX_EPOCH).unwrap().as_nanos();
    let mut p = std::env::temp_dir();
    p.push(format!("hepplot_cli_{}_{}_{}", std::process::id(), nanos, name));
    std::fs::create_dir_all(&p).unwrap();
    p
}

fn run(args: &[&str]) -> Output {
    Command::new(bin_path())
        .args(args)
        .output()
        .unwrap_or_else(|e| panic!("failed to run {:?} {:?}: {}", bin_path(), args, e))
}

/// Two variables, two categories, one paired systematic on the MC sample.
fn write_fixtures(dir: &PathBuf) -> (PathBuf, PathBuf) {
    let hists = serde_json::json!({
        "variables": {
            "mjj": {
                "axis_label": "m(jj) [GeV]",
                "bin_edges": [0.0, 50.0, 100.0],
                "samples": {
                    "DATA_muon": { "categories": {
                        "baseline": { "nominal": { "values": [10.0, 20.0] } },
                        "boosted": { "nominal": { "values": [4.0, 6.0] } }
                    } },
                    "ttbar": { "categories": {
                        "baseline": {
                            "nominal": { "values": [9.0, 19.0], "variances": [0.9, 1.9] },
                            "jesUp": { "values": [10.0, 20.0] },
                            "jesDown": { "values": [8.0, 18.0] }
                        },
                        "boosted": {
                            "nominal": { "values": [3.0, 7.0] },
                            "jesUp": { "values": [3.3, 7.7] },
                            "jesDown": { "values": [2.7, 6.3] }
                        }
                    } }
                }
            },
            "njet": {
                "bin_edges": [0.0, 1.0, 2.0, 3.0],
                "samples": {
                    "ttbar": { "categories": {
                        "baseline": { "nominal": { "values": [5.0, 3.0, 1.0] } }
                    } }
                }
            }
        }
    });
    let params = serde_json::json!({
        "data_key": "DATA",
        "experiment": { "name": "CMS", "status": "Preliminary", "sqrt_s_tev": 13.6, "lumi_fb_inv": 138.0 }
    });

    let hists_path = dir.join("hists.json");
    let params_path = dir.join("params.json");
    std::fs::write(&hists_path, serde_json::to_vec_pretty(&hists).unwrap()).unwrap();
    std::fs::write(&params_path, serde_json::to_vec_pretty(&params).unwrap()).unwrap();
    (params_path, hists_path)
}

fn assert_svg(path: &PathBuf) {
    assert!(path.exists(), "missing plot: {}", path.display());
    let text = std::fs::read_to_string(path).unwrap();
    assert!(text.starts_with("<svg"), "not an SVG: {}", path.display());
}

#[test]
fn renders_one_plot_per_category_variable_pair() {
    let work = tmp_dir("basic");
    let (params, hists) = write_fixtures(&work);
    let out_dir = work.join("plots");

    let out = run(&[
        "--cfg",
        params.to_string_lossy().as_ref(),
        "-i",
        hists.to_string_lossy().as_ref(),
        "-o",
        out_dir.to_string_lossy().as_ref(),
        "-j",
        "2",
    ]);
    assert!(
        out.status.success(),
        "plot run should succeed, stderr={}",
        String::from_utf8_lossy(&out.stderr)
    );

    assert_svg(&out_dir.join("baseline/mjj_baseline.svg"));
    assert_svg(&out_dir.join("boosted/mjj_boosted.svg"));
    // njet is only stored for baseline.
    assert_svg(&out_dir.join("baseline/njet_baseline.svg"));
    assert!(!out_dir.join("boosted/njet_boosted.svg").exists());
}

#[test]
fn only_cat_on_absent_category_yields_zero_outputs_and_success() {
    let work = tmp_dir("absent_cat");
    let (params, hists) = write_fixtures(&work);
    let out_dir = work.join("plots");

    let out = run(&[
        "--cfg",
        params.to_string_lossy().as_ref(),
        "-i",
        hists.to_string_lossy().as_ref(),
        "-o",
        out_dir.to_string_lossy().as_ref(),
        "--only_cat",
        "does_not_exist",
    ]);
    assert!(
        out.status.success(),
        "absent --only_cat should not fail, stderr={}",
        String::from_utf8_lossy(&out.stderr)
    );
    let entries: Vec<_> = out_dir.read_dir().unwrap().collect();
    assert!(entries.is_empty(), "expected no outputs, found {:?}", entries);
}

#[test]
fn nonempty_output_dir_requires_overwrite() {
    let work = tmp_dir("collision");
    let (params, hists) = write_fixtures(&work);
    let out_dir = work.join("plots");

    let base_args = |extra: &[&str]| -> Vec<String> {
        let mut v = vec![
            "--cfg".into(),
            params.to_string_lossy().into_owned(),
            "-i".into(),
            hists.to_string_lossy().into_owned(),
            "-o".into(),
            out_dir.to_string_lossy().into_owned(),
        ];
        v.extend(extra.iter().map(|s| s.to_string()));
        v
    };

    let first = Command::new(bin_path()).args(base_args(&[])).output().unwrap();
    assert!(first.status.success());

    let second = Command::new(bin_path()).args(base_args(&[])).output().unwrap();
    assert!(!second.status.success(), "rerun without --overwrite should fail");
    assert!(
        String::from_utf8_lossy(&second.stderr).contains("--overwrite"),
        "stderr should point at --overwrite"
    );

    let third = Command::new(bin_path()).args(base_args(&["--overwrite"])).output().unwrap();
    assert!(third.status.success(), "rerun with --overwrite should succeed");
}

#[test]
fn exclude_hist_filters_variables_by_regex() {
    let work = tmp_dir("exclude");
    let (params, hists) = write_fixtures(&work);
    let out_dir = work.join("plots");

    let out = run(&[
        "--cfg",
        params.to_string_lossy().as_ref(),
        "-i",
        hists.to_string_lossy().as_ref(),
        "-o",
        out_dir.to_string_lossy().as_ref(),
        "--exclude_hist",
        "^nje",
    ]);
    assert!(out.status.success());
    assert_svg(&out_dir.join("baseline/mjj_baseline.svg"));
    assert!(!out_dir.join("baseline/njet_baseline.svg").exists());
}

#[test]
fn split_systematics_adds_per_source_plots() {
    let work = tmp_dir("split");
    let (params, hists) = write_fixtures(&work);
    let out_dir = work.join("plots");

    let out = run(&[
        "--cfg",
        params.to_string_lossy().as_ref(),
        "-i",
        hists.to_string_lossy().as_ref(),
        "-o",
        out_dir.to_string_lossy().as_ref(),
        "--split_systematics",
        "--only_cat",
        "baseline",
    ]);
    assert!(
        out.status.success(),
        "stderr={}",
        String::from_utf8_lossy(&out.stderr)
    );
    assert_svg(&out_dir.join("baseline/mjj_baseline.svg"));
    assert_svg(&out_dir.join("baseline/mjj_baseline_jes.svg"));
    // mcstat never gets a variation plot.
    assert!(!out_dir.join("baseline/mjj_baseline_mcstat.svg").exists());
}

#[test]
fn log_scale_outputs_land_in_log_subdir() {
    let work = tmp_dir("log");
    let (params, hists) = write_fixtures(&work);
    let out_dir = work.join("plots");

    let out = run(&[
        "--cfg",
        params.to_string_lossy().as_ref(),
        "-i",
        hists.to_string_lossy().as_ref(),
        "-o",
        out_dir.to_string_lossy().as_ref(),
        "--log",
        "--only_cat",
        "baseline",
    ]);
    assert!(out.status.success());
    assert_svg(&out_dir.join("baseline/log/mjj_baseline.svg"));
    assert!(!out_dir.join("baseline/mjj_baseline.svg").exists());
}

#[test]
fn style_override_relabels_samples() {
    let work = tmp_dir("override");
    let (params, hists) = write_fixtures(&work);
    let out_dir = work.join("plots");

    let op = work.join("style.yaml");
    std::fs::write(
        &op,
        "labels_mc:\n  ttbar: \"Top pair production\"\ncolors_mc:\n  ttbar: [18, 52, 86]\n",
    )
    .unwrap();

    let out = run(&[
        "--cfg",
        params.to_string_lossy().as_ref(),
        "-i",
        hists.to_string_lossy().as_ref(),
        "-o",
        out_dir.to_string_lossy().as_ref(),
        "--op",
        op.to_string_lossy().as_ref(),
        "--only_cat",
        "baseline",
    ]);
    assert!(
        out.status.success(),
        "stderr={}",
        String::from_utf8_lossy(&out.stderr)
    );
    let svg = std::fs::read_to_string(out_dir.join("baseline/mjj_baseline.svg")).unwrap();
    assert!(svg.contains("Top pair production"));
    assert!(svg.contains("#123456"));
}

#[test]
fn experiment_header_comes_from_the_analysis_config() {
    let work = tmp_dir("header");
    let (params, hists) = write_fixtures(&work);
    let out_dir = work.join("plots");

    let out = run(&[
        "--cfg",
        params.to_string_lossy().as_ref(),
        "-i",
        hists.to_string_lossy().as_ref(),
        "-o",
        out_dir.to_string_lossy().as_ref(),
        "--only_cat",
        "baseline",
    ]);
    assert!(out.status.success());
    let svg = std::fs::read_to_string(out_dir.join("baseline/mjj_baseline.svg")).unwrap();
    assert!(svg.contains(">CMS<"));
    assert!(svg.contains("Preliminary"));
    assert!(svg.contains("138 fb"));
}
