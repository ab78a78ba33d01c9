use serde_json::json;

use crate::adapter::{
    CommandTemplate, Constraint, OutputFormat, ParamSpec, ParamType, Segment, ToolSpec,
};

fn existing(name: &str, description: &str) -> ParamSpec {
    ParamSpec::required(name, ParamType::String, description).with(Constraint::PathExists)
}

fn encoding(name: &str, description: &str) -> ParamSpec {
    ParamSpec::optional(name, ParamType::one_of(&["PEM", "DER"]), description).default(json!("PEM"))
}

pub(super) fn tools() -> Vec<ToolSpec> {
    vec![
        ToolSpec::command(
            "openssl.generate_self_signed_cert",
            "Create a self-signed certificate and unencrypted key named <common_name>.crt/.key",
            CommandTemplate::new("openssl")
                .literals(&["req", "-x509", "-nodes", "-newkey"])
                .arg(Segment::format("rsa:{key_size}"))
                .arg(Segment::literal("-keyout"))
                .arg(Segment::format("{output_dir}/{common_name}.key"))
                .arg(Segment::literal("-out"))
                .arg(Segment::format("{output_dir}/{common_name}.crt"))
                .arg(Segment::opt("days", "-days"))
                .arg(Segment::literal("-subj"))
                .arg(Segment::format("/CN={common_name}")),
        )
        .param(
            ParamSpec::required("common_name", ParamType::String, "Certificate CN")
                .with(Constraint::Identifier),
        )
        .param(existing("output_dir", "Directory receiving the key and certificate"))
        .param(
            ParamSpec::optional("days", ParamType::Integer, "Validity in days")
                .default(json!(365))
                .with(Constraint::range(1, 36500)),
        )
        .param(
            ParamSpec::optional("key_size", ParamType::Integer, "RSA key size in bits")
                .default(json!(2048))
                .with(Constraint::range(1024, 16384)),
        ),
        ToolSpec::command(
            "openssl.view_certificate",
            "Show subject, issuer, validity dates and serial of a certificate",
            CommandTemplate::new("openssl")
                .literals(&["x509", "-noout", "-subject", "-issuer", "-dates", "-serial", "-in"])
                .arg(Segment::param("cert_path")),
        )
        .param(existing("cert_path", "Certificate file"))
        .output(OutputFormat::KeyValue { sep: '=' }),
        ToolSpec::command(
            "openssl.verify_certificate",
            "Verify a certificate chain",
            CommandTemplate::new("openssl")
                .literals(&["verify"])
                .arg(Segment::opt("ca_path", "-CAfile"))
                .arg(Segment::param("cert_path")),
        )
        .param(existing("cert_path", "Certificate file"))
        .param(
            ParamSpec::optional("ca_path", ParamType::String, "CA bundle")
                .with(Constraint::PathExists),
        ),
        ToolSpec::command(
            "openssl.convert_certificate",
            "Convert a certificate between PEM and DER",
            CommandTemplate::new("openssl")
                .literals(&["x509"])
                .arg(Segment::opt("input_path", "-in"))
                .arg(Segment::opt("output_path", "-out"))
                .arg(Segment::opt("input_format", "-inform"))
                .arg(Segment::opt("output_format", "-outform")),
        )
        .param(existing("input_path", "Source certificate"))
        .param(
            ParamSpec::required("output_path", ParamType::String, "Destination file")
                .with(Constraint::NonEmpty),
        )
        .param(encoding("input_format", "Source encoding"))
        .param(encoding("output_format", "Destination encoding")),
    ]
}
