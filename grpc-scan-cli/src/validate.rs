use crate::cli::ConnectionArgs;

/// Validate the connection flags shared by every subcommand.
///
/// Mirrors the host crate's validation style: hard errors return
/// `Err(message)` describing exactly which flag combination is invalid.
pub fn validate_connection(conn: &ConnectionArgs) -> Result<(), String> {
    if let Some(t) = conn.connect_timeout {
        if t < 0.0 {
            return Err("The --connect-timeout argument must not be negative.".into());
        }
    }
    if let Some(t) = conn.keepalive_time {
        if t < 0.0 {
            return Err("The --keepalive-time argument must not be negative.".into());
        }
    }
    if let Some(t) = conn.max_time {
        if t < 0.0 {
            return Err("The --max-time argument must not be negative.".into());
        }
    }
    if let Some(sz) = conn.max_msg_sz {
        if sz < 0 {
            return Err("The --max-msg-sz argument must not be negative.".into());
        }
    }

    let use_tls = !conn.plaintext && !conn.alts;

    if conn.plaintext && conn.alts {
        return Err("The --plaintext and --alts arguments are mutually exclusive.".into());
    }
    if conn.insecure && !use_tls {
        return Err("The --insecure argument can only be used with TLS.".into());
    }
    if conn.cert.is_some() && !use_tls {
        return Err("The --cert argument can only be used with TLS.".into());
    }
    if conn.key.is_some() && !use_tls {
        return Err("The --key argument can only be used with TLS.".into());
    }
    if conn.cert.is_some() != conn.key.is_some() {
        return Err("The --cert and --key arguments must be used together.".into());
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_negative_connect_timeout() {
        let conn = ConnectionArgs {
            connect_timeout: Some(-1.0),
            ..ConnectionArgs::default()
        };
        assert!(validate_connection(&conn).is_err());
    }

    #[test]
    fn rejects_plaintext_and_alts_together() {
        let conn = ConnectionArgs {
            plaintext: true,
            alts: true,
            ..ConnectionArgs::default()
        };
        assert!(validate_connection(&conn).is_err());
    }

    #[test]
    fn rejects_insecure_with_plaintext() {
        let conn = ConnectionArgs {
            plaintext: true,
            insecure: true,
            ..ConnectionArgs::default()
        };
        assert!(validate_connection(&conn).is_err());
    }

    #[test]
    fn rejects_cert_without_key() {
        let conn = ConnectionArgs {
            cert: Some("cert.pem".to_string()),
            ..ConnectionArgs::default()
        };
        assert!(validate_connection(&conn).is_err());
    }

    #[test]
    fn accepts_default_connection_args() {
        let conn = ConnectionArgs::default();
        assert!(validate_connection(&conn).is_ok());
    }
}
