//! Command helper methods for Test.

use std::process::Output;

use assert_cmd::Command;

use super::Test;

impl Test {
    /// Create a ghseal command isolated from the caller's environment.
    ///
    /// HOME points at the temporary home, so the default config lives at
    /// `<home>/.ghseal/config.toml`.
    pub fn cmd(&self) -> Command {
        #[allow(deprecated)]
        let mut cmd = Command::cargo_bin("ghseal").expect("failed to find ghseal binary");
        cmd.env("HOME", self.home.path());
        cmd.env("USERPROFILE", self.home.path());
        cmd.env("NO_COLOR", "1");
        for var in [
            "GHSEAL_CONFIG",
            "GHSEAL_LOG",
            "GHSEAL_PUBLIC_KEY",
            "GHSEAL_PRIVATE_KEY",
            "GHSEAL_GITHUB_API_URL",
            "GHSEAL_ENCRYPTED_PAT",
        ] {
            cmd.env_remove(var);
        }
        cmd
    }

    /// Run ghseal with `args`.
    pub fn run(&self, args: &[&str]) -> Output {
        self.cmd()
            .args(args)
            .output()
            .expect("failed to run ghseal")
    }

    /// Shortcut for `ghseal keygen --save`.
    pub fn keygen(&self) -> Output {
        self.run(&["keygen", "--save"])
    }

    /// Shortcut for `ghseal encrypt`.
    pub fn encrypt(&self, value: &str, kind: &str) -> Output {
        self.run(&["encrypt", value, "--kind", kind])
    }

    /// Shortcut for `ghseal decrypt`.
    pub fn decrypt(&self, payload: &str, kind: &str) -> Output {
        self.run(&["decrypt", payload, "--kind", kind])
    }

    /// Shortcut for `ghseal validate`.
    pub fn validate(&self, payload: &str, kind: &str) -> Output {
        self.run(&["validate", payload, "--kind", kind])
    }
}
