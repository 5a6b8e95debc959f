use std::path::Path;
use std::process::{Command, Output};

fn classref(dir: &Path, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_classref"))
        .current_dir(dir)
        .args(args)
        .output()
        .unwrap()
}

fn write(dir: &Path, rel: &str, contents: &str) {
    let path = dir.join(rel);
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    std::fs::write(path, contents).unwrap();
}

fn read(dir: &Path, rel: &str) -> String {
    std::fs::read_to_string(dir.join(rel)).unwrap()
}

fn json(output: &Output) -> serde_json::Value {
    assert!(
        output.status.success(),
        "command failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    serde_json::from_slice(&output.stdout).unwrap()
}

fn project() -> tempfile::TempDir {
    let dir = tempfile::tempdir().unwrap();
    write(dir.path(), "A.php", "<?php\n\nnew Foo\\Bar();\n");
    write(dir.path(), "B.php", "<?php\n\nnew Baz();\n");
    dir
}

#[test]
fn references_report_only_matching_files() {
    let dir = project();
    let value = json(&classref(dir.path(), &["references", "Foo\\Bar", "--json"]));

    let results = value["results"].as_array().unwrap();
    assert_eq!(results.len(), 1);
    assert!(results[0]["file"].as_str().unwrap().ends_with("A.php"));

    let reference = &results[0]["references"][0];
    assert_eq!(reference["start"], 11);
    assert_eq!(reference["line_no"], 3);
    assert_eq!(reference["col_no"], 4);
    assert_eq!(reference["line"], "new Foo\\Bar();");
    assert_eq!(results[0]["replacements"].as_array().unwrap().len(), 0);
}

#[test]
fn references_text_output_is_grep_style() {
    let dir = project();
    let output = classref(dir.path(), &["references", "Foo\\Bar"]);
    assert!(output.status.success());

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("A.php:3:4  new Foo\\Bar();"), "{stdout}");
    assert!(!stdout.contains("B.php"), "{stdout}");
    assert!(stdout.ends_with("1 reference in 1 file\n"), "{stdout}");
}

#[test]
fn rename_rewrites_matching_files_only() {
    let dir = project();
    let value = json(&classref(dir.path(), &["rename", "Foo\\Bar", "Foo\\Qux", "--json"]));

    assert_eq!(read(dir.path(), "A.php"), "<?php\n\nnew Foo\\Qux();\n");
    assert_eq!(read(dir.path(), "B.php"), "<?php\n\nnew Baz();\n");

    let replacement = &value["results"][0]["replacements"][0];
    assert_eq!(replacement["reference"], "Foo\\Qux");
    assert_eq!(replacement["line_no"], 3);
    assert_eq!(replacement["col_no"], 4);
    assert_eq!(replacement["line"], "new Foo\\Qux();");
}

#[test]
fn dry_run_leaves_disk_untouched() {
    let dir = project();
    let output = classref(dir.path(), &["rename", "Foo\\Bar", "Foo\\Qux", "--dry-run"]);
    assert!(output.status.success());

    assert_eq!(read(dir.path(), "A.php"), "<?php\n\nnew Foo\\Bar();\n");
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("[REPL] "), "{stdout}");
    assert!(stdout.contains("\n       11:18 Foo\\Bar => Foo\\Qux\n"), "{stdout}");
    assert!(stdout.contains("would rename 1 reference in 1 file"), "{stdout}");
}

#[test]
fn rename_there_and_back_restores_bytes() {
    let dir = tempfile::tempdir().unwrap();
    let original = "<?php\r\nnamespace App;\r\n\r\nuse A\\B\\Foo;\r\n\r\nclass X extends \\A\\B\\Foo implements Other\r\n{\r\n    public function make(): A\\B\\Foo { return new A\\B\\Foo(); }\r\n}\r\n";
    write(dir.path(), "src/X.php", original);

    assert!(classref(dir.path(), &["rename", "A\\B\\Foo", "A\\B\\Bar"]).status.success());
    assert!(!read(dir.path(), "src/X.php").contains("Foo"));
    assert!(classref(dir.path(), &["rename", "A\\B\\Bar", "A\\B\\Foo"]).status.success());

    assert_eq!(read(dir.path(), "src/X.php"), original);
}

#[test]
fn unknown_root_fails_with_diagnostic() {
    let dir = project();
    let output = classref(dir.path(), &["rename", "Foo\\Bar", "Foo\\Qux", "--root", "vendor"]);

    assert_eq!(output.status.code(), Some(1));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("Unknown Root"), "{stderr}");
    assert_eq!(read(dir.path(), "A.php"), "<?php\n\nnew Foo\\Bar();\n");
}

#[test]
fn configured_root_and_path_input() {
    let dir = tempfile::tempdir().unwrap();
    write(
        dir.path(),
        ".classref.toml",
        "default_root = \"app\"\n\n[roots.app]\nkind = \"simple\"\npath = \"src\"\n\n[autoload]\n\"Shop\\\\\" = \"src/\"\n",
    );
    write(dir.path(), "src/Cart/Item.php", "<?php\nnamespace Shop\\Cart;\n\nclass Item {}\n");
    write(dir.path(), "src/Checkout.php", "<?php\nnamespace Shop;\n\nuse Shop\\Cart\\Item;\n");
    write(dir.path(), "scripts/seed.php", "<?php\nnew Shop\\Cart\\Item();\n");

    let value = json(&classref(dir.path(), &["references", "src/Cart/Item.php", "--json"]));
    let results = value["results"].as_array().unwrap();
    assert_eq!(results.len(), 1, "{value}");
    assert!(results[0]["file"].as_str().unwrap().ends_with("Checkout.php"));
    assert_eq!(results[0]["references"][0]["reference"], "Shop\\Cart\\Item");
}

#[test]
fn absolute_path_input_resolves_against_the_working_directory() {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path().canonicalize().unwrap();
    write(&root, ".classref.toml", "[autoload]\n\"Shop\\\\\" = \"src/\"\n");
    write(&root, "src/Cart/Item.php", "<?php\nnamespace Shop\\Cart;\n\nclass Item {}\n");
    write(&root, "src/Checkout.php", "<?php\nnew \\Shop\\Cart\\Item();\n");

    let absolute = root.join("src/Cart/Item.php");
    let value = json(&classref(&root, &["references", absolute.to_str().unwrap(), "--json"]));
    let results = value["results"].as_array().unwrap();
    assert_eq!(results.len(), 1, "{value}");
    assert_eq!(results[0]["references"][0]["reference"], "Shop\\Cart\\Item");
}

fn shop() -> tempfile::TempDir {
    let dir = tempfile::tempdir().unwrap();
    write(dir.path(), ".classref.toml", "[autoload]\n\"Shop\\\\\" = \"src/\"\n");
    write(
        dir.path(),
        "src/Cart/Item.php",
        "<?php\nnamespace Shop\\Cart;\n\nclass Item\n{\n    public static function make(): \\Shop\\Cart\\Item { return new \\Shop\\Cart\\Item(); }\n}\n",
    );
    write(dir.path(), "src/Checkout.php", "<?php\nnew \\Shop\\Cart\\Item();\n");
    dir
}

#[test]
fn copy_writes_a_renamed_class_and_leaves_the_original() {
    let dir = shop();
    let output = classref(dir.path(), &["copy", "src/Cart/Item.php", "src/Order/Line.php"]);
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));

    assert_eq!(
        read(dir.path(), "src/Order/Line.php"),
        "<?php\nnamespace Shop\\Order;\n\nclass Line\n{\n    public static function make(): \\Shop\\Order\\Line { return new \\Shop\\Order\\Line(); }\n}\n"
    );
    assert!(read(dir.path(), "src/Cart/Item.php").contains("class Item"));
    assert_eq!(read(dir.path(), "src/Checkout.php"), "<?php\nnew \\Shop\\Cart\\Item();\n");

    let stdout = String::from_utf8_lossy(&output.stdout);
    let first = stdout.lines().next().unwrap();
    assert!(first.starts_with("[COPY] "), "{stdout}");
    assert!(first.contains("src/Cart/Item.php => "), "{stdout}");
    assert!(first.ends_with("src/Order/Line.php"), "{stdout}");
    assert!(stdout.ends_with("copied Shop\\Cart\\Item as Shop\\Order\\Line\n"), "{stdout}");
}

#[test]
fn copy_dry_run_and_existing_destination() {
    let dir = shop();
    let output = classref(dir.path(), &["copy", "Shop\\Cart\\Item", "Shop\\Cart\\Entry", "--dry-run"]);
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));
    assert!(!dir.path().join("src/Cart/Entry.php").exists());
    assert!(String::from_utf8_lossy(&output.stdout).ends_with("would copy Shop\\Cart\\Item as Shop\\Cart\\Entry\n"));

    let before = read(dir.path(), "src/Checkout.php");
    let output = classref(dir.path(), &["copy", "src/Cart/Item.php", "src/Checkout.php"]);
    assert_eq!(output.status.code(), Some(1));
    assert!(String::from_utf8_lossy(&output.stderr).contains("Destination Exists"));
    assert_eq!(read(dir.path(), "src/Checkout.php"), before);
}

#[test]
fn composer_root_scans_autoload_directories() {
    let dir = tempfile::tempdir().unwrap();
    write(dir.path(), "composer.json", r#"{ "autoload": { "psr-4": { "Shop\\": "src/" } } }"#);
    write(dir.path(), "src/Checkout.php", "<?php\nuse Shop\\Cart\\Item;\n");
    write(dir.path(), "scripts/seed.php", "<?php\nnew Shop\\Cart\\Item();\n");

    let value = json(&classref(dir.path(), &["references", "Shop\\Cart\\Item", "--root", "composer", "--json"]));
    let results = value["results"].as_array().unwrap();
    assert_eq!(results.len(), 1, "{value}");
    assert!(results[0]["file"].as_str().unwrap().ends_with("Checkout.php"));
}

#[test]
fn roots_lists_builtins_with_default_marked() {
    let dir = tempfile::tempdir().unwrap();
    let output = classref(dir.path(), &["roots"]);
    assert!(output.status.success());

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert_eq!(stdout, "  composer  composer  .\n  git  git  .\n* simple  simple  .\n");
}

#[test]
fn invalid_class_name_is_rejected() {
    let dir = project();
    let output = classref(dir.path(), &["references", "1Nope"]);
    assert_eq!(output.status.code(), Some(1));
    assert!(String::from_utf8_lossy(&output.stderr).contains("Invalid Class Name"));
}
