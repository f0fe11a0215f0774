//! Properties of the download and upload command lines

use proptest::prelude::*;
use std::path::{Path, PathBuf};
use uuid::Uuid;
use zadviser::command::{
    CliCompatibility, CliInstallation, DownloadInputs, ShellKind, ZADVISER_MINIMUM_CLI_VERSION,
    build_download_arguments, flags,
};
use zadviser::executor::TOPAZ_CLI_WORKSPACE;
use zadviser::{
    ArgumentVector, Credentials, DownloadParameters, HostConnection, Sensitive, StepError,
    ZAdviserSettings,
};

fn path_strategy() -> impl Strategy<Value = String> {
    prop_oneof![
        Just(String::new()),
        Just("   ".to_string()),
        "/[a-z]{1,8}/[a-z]{1,8}\\.csv",
        "/[a-z]{1,4} [a-z]{1,4}/\"[a-z]{1,4}\"\\.csv",
    ]
}

fn settings(last_run: Option<i64>, initial_range: Option<u32>) -> ZAdviserSettings {
    let mut settings = ZAdviserSettings::default();
    settings.access_key = Some(Sensitive::new("accessKeyValue"));
    settings.encryption_key = Some(Sensitive::new("encryptionKeyValue"));
    settings.customer_id = Some("customerIdValue".to_string());
    settings.initial_date_range = initial_range.map(|days| days.to_string());
    if let Some(millis) = last_run {
        settings.last_execution_times.insert("cw01".to_string(), millis);
    }
    settings
}

fn build(
    params: &DownloadParameters,
    settings: &ZAdviserSettings,
    data_dir: &Path,
) -> Result<ArgumentVector, StepError> {
    let connection = HostConnection::new("12345", "cw01", 30947);
    let credentials = Credentials::new("67890", "xdevreg", Sensitive::new("pw"));
    let cli = CliInstallation::new("/opt/cli", ShellKind::Posix, ZADVISER_MINIMUM_CLI_VERSION);
    let compatibility = CliCompatibility::default();

    build_download_arguments(&DownloadInputs {
        params,
        connection: &connection,
        credentials: &credentials,
        settings,
        cli: &cli,
        compatibility: &compatibility,
        data_dir,
        jcl_file: Path::new("/ws/jcl.txt"),
        persist_root: "/var/jenkins",
    })
}

fn data_dir(id: Uuid) -> PathBuf {
    Path::new("/ws").join(format!("{TOPAZ_CLI_WORKSPACE}{id}"))
}

proptest! {
    #[test]
    fn exactly_one_date_flag(
        encrypt in any::<bool>(),
        upload in any::<bool>(),
        last_run in proptest::option::of(1_i64..4_102_444_800_000),
        initial_range in proptest::option::of(0_u32..3650),
    ) {
        let params = DownloadParameters::new("12345", "67890", "jcl", "/d/u.csv", "/d/e.csv")
            .with_encrypt_data(encrypt)
            .with_upload_data(upload);
        let result = build(&params, &settings(last_run, initial_range), &data_dir(Uuid::nil()));

        match (last_run, initial_range) {
            (None, None) => prop_assert!(matches!(result, Err(StepError::Configuration(_)))),
            (Some(millis), _) => {
                let args = result.unwrap();
                prop_assert_eq!(args.value_of(flags::LAST_DATE_RUN).unwrap().raw(), millis.to_string());
                prop_assert!(!args.contains(flags::INITIAL_DATE_RANGE));
            }
            (None, Some(days)) => {
                let args = result.unwrap();
                prop_assert_eq!(args.value_of(flags::INITIAL_DATE_RANGE).unwrap().raw(), days.to_string());
                prop_assert!(!args.contains(flags::LAST_DATE_RUN));
            }
        }
    }

    #[test]
    fn upload_file_follows_encrypt_flag(
        encrypt in any::<bool>(),
        upload in any::<bool>(),
        unencrypted in path_strategy(),
        encrypted in path_strategy(),
    ) {
        let params = DownloadParameters::new("12345", "67890", "jcl", &unencrypted, &encrypted)
            .with_encrypt_data(encrypt)
            .with_upload_data(upload);
        let args = build(&params, &settings(None, Some(30)), &data_dir(Uuid::nil())).unwrap();

        let chosen = if encrypt { encrypted.trim() } else { unencrypted.trim() };
        let expected = (upload && !chosen.is_empty()).then(|| chosen.to_string());
        let actual = args.value_of(flags::UPLOAD_DATA_FILE).map(|value| value.raw().to_string());
        prop_assert_eq!(actual, expected);

        prop_assert_eq!(args.contains(flags::ACCESS_KEY), encrypt || upload);
        prop_assert_eq!(args.contains(flags::ENCRYPTION_KEY), encrypt);
        prop_assert_eq!(args.flags().count(), args.flags().collect::<std::collections::HashSet<_>>().len());
    }

    #[test]
    fn workspace_id_only_changes_data_flag(first in any::<u128>(), second in any::<u128>()) {
        let params = DownloadParameters::new("12345", "67890", "jcl", "/d/u.csv", "/d/e.csv");
        let settings = settings(Some(1_700_000_000_000), None);
        let (first, second) = (Uuid::from_u128(first), Uuid::from_u128(second));

        let a = build(&params, &settings, &data_dir(first)).unwrap();
        let b = build(&params, &settings, &data_dir(second)).unwrap();

        prop_assert_eq!(a.program(), b.program());
        prop_assert_eq!(a.len(), b.len());
        for (left, right) in a.arguments().iter().zip(b.arguments()) {
            prop_assert_eq!(left.flag, right.flag);
            if left.flag == flags::DATA {
                let expected_left = format!("{TOPAZ_CLI_WORKSPACE}{first}");
                let expected_right = format!("{TOPAZ_CLI_WORKSPACE}{second}");
                prop_assert!(left.value.raw().ends_with(&expected_left));
                prop_assert!(right.value.raw().ends_with(&expected_right));
            } else {
                prop_assert_eq!(&left.value, &right.value);
            }
        }
    }
}

#[test]
fn example_upload_unencrypted() {
    let params = DownloadParameters::new("12345", "67890", "jcl", "/d/u.csv", "/d/e.csv")
        .with_encrypt_data(false)
        .with_upload_data(true);
    let args = build(&params, &settings(None, Some(30)), &data_dir(Uuid::nil())).unwrap();
    assert_eq!(args.value_of(flags::UPLOAD_DATA_FILE).unwrap().raw(), "/d/u.csv");
    assert_eq!(args.value_of(flags::INITIAL_DATE_RANGE).unwrap().raw(), "30");
}

#[test]
fn example_upload_encrypted() {
    let params = DownloadParameters::new("12345", "67890", "jcl", "/d/u.csv", "/d/e.csv")
        .with_encrypt_data(true)
        .with_upload_data(true);
    let args = build(&params, &settings(None, Some(30)), &data_dir(Uuid::nil())).unwrap();
    assert_eq!(args.value_of(flags::UPLOAD_DATA_FILE).unwrap().raw(), "/d/e.csv");
    assert!(args.contains(flags::ACCESS_KEY));
    assert!(args.contains(flags::ENCRYPTION_KEY));
}
