use lualinter::e_command_builder::CompilerCommandBuilder;
use lualinter::e_config::{Interpreter, LinterConfig};
use std::path::{Path, PathBuf};

#[test]
fn integration_test_builder() {
    let config = LinterConfig {
        interpreter: Interpreter::from_name_or_default("luajit"),
        compiler_path: Some(PathBuf::from("/opt/luajit/bin/luajit")),
        ..LinterConfig::default()
    };

    let cmd = CompilerCommandBuilder::new()
        .with_config(&config)
        .with_cwd(Path::new("scripts"))
        .build();

    assert!(cmd.args.contains(&"-bl".to_string()));
    assert_eq!(cmd.args.last().map(String::as_str), Some("-"));
    assert_eq!(cmd.cwd, PathBuf::from("scripts"));

    let std_cmd = cmd.to_command();
    assert_eq!(std_cmd.get_program(), "/opt/luajit/bin/luajit");
    assert_eq!(std_cmd.get_current_dir(), Some(Path::new("scripts")));
}
