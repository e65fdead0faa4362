//! Fixed-width text report of tenants and their users.

use std::io::{self, Write};

use crate::directory::UserRecord;
use crate::onboard::TenantOutcome;
use crate::tenants::Tenant;

/// Width every column is padded to.
pub const COLUMN_WIDTH: usize = 36;

/// Width of a full three-column row, separators included.
const ROW_WIDTH: usize = COLUMN_WIDTH * 3 + 2;

fn write_row<W: Write>(out: &mut W, a: &str, b: &str, c: &str) -> io::Result<()> {
    writeln!(
        out,
        "{:<w$} {:<w$} {:<w$}",
        a,
        b,
        c,
        w = COLUMN_WIDTH
    )
}

fn write_rule<W: Write>(out: &mut W, ch: char) -> io::Result<()> {
    writeln!(out, "{}", ch.to_string().repeat(ROW_WIDTH))
}

/// Write the table of all tenants.
pub fn write_tenant_table<W: Write>(out: &mut W, tenants: &[Tenant]) -> io::Result<()> {
    let divider = "-".repeat(COLUMN_WIDTH);
    write_row(out, &divider, &divider, &divider)?;
    write_row(out, "DisplayName", "TenantId", "DefaultDomain")?;
    write_row(out, &divider, &divider, &divider)?;

    for tenant in tenants {
        write_row(
            out,
            &tenant.display_name,
            &tenant.tenant_id,
            &tenant.default_domain,
        )?;
    }

    Ok(())
}

/// Write the banner for one tenant followed by its users.
///
/// A failed tenant gets its banner on `out` and a single `ERROR:` line on
/// `errors`; no user table is written.
pub fn write_outcome<W: Write, E: Write>(
    out: &mut W,
    errors: &mut E,
    outcome: &TenantOutcome,
) -> io::Result<()> {
    let tenant = &outcome.tenant;

    writeln!(out)?;
    write_rule(out, '=')?;
    writeln!(out, "{} ({})", tenant.display_name, tenant.default_domain)?;
    write_rule(out, '=')?;

    match &outcome.result {
        Ok(users) => write_user_table(out, users),
        Err(e) => {
            out.flush()?;
            writeln!(errors, "ERROR: {}", e)?;
            errors.flush()
        }
    }
}

/// Write the user table for a tenant.
pub fn write_user_table<W: Write>(out: &mut W, users: &[UserRecord]) -> io::Result<()> {
    write_rule(out, '-')?;
    write_row(out, "Display Name", "Id", "Email")?;
    write_rule(out, '-')?;

    if users.is_empty() {
        writeln!(out, "No users found")?;
        return Ok(());
    }

    for user in users {
        write_row(out, &user.display_name, &user.id, &user.mail)?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{AppError, AuthError};

    fn render(f: impl FnOnce(&mut Vec<u8>) -> io::Result<()>) -> String {
        let mut buf = Vec::new();
        f(&mut buf).unwrap();
        String::from_utf8(buf).unwrap()
    }

    fn contoso() -> Tenant {
        Tenant {
            tenant_id: "t1".into(),
            display_name: "Contoso".into(),
            default_domain: "contoso.com".into(),
            ..Tenant::default()
        }
    }

    #[test]
    fn test_tenant_table() {
        let text = render(|out| write_tenant_table(out, &[contoso()]));
        let lines: Vec<&str> = text.lines().collect();

        assert_eq!(lines.len(), 4);
        assert_eq!(lines[0], lines[2]);
        assert_eq!(lines[0].len(), ROW_WIDTH);
        assert_eq!(
            lines[1],
            format!("{:<36} {:<36} {:<36}", "DisplayName", "TenantId", "DefaultDomain")
        );
        assert_eq!(
            lines[3],
            format!("{:<36} {:<36} {:<36}", "Contoso", "t1", "contoso.com")
        );
        assert_eq!(&lines[3][37..39], "t1");
        assert_eq!(&lines[3][74..85], "contoso.com");
    }

    #[test]
    fn test_missing_email_is_blank_not_null() {
        let users = vec![UserRecord {
            display_name: "Guest".into(),
            id: "u1".into(),
            mail: String::new(),
        }];
        let text = render(|out| write_user_table(out, &users));
        let row = text.lines().nth(3).unwrap();

        assert_eq!(row, format!("{:<36} {:<36} {:<36}", "Guest", "u1", ""));
        assert_eq!(row.len(), ROW_WIDTH);
        assert!(!text.contains("null"));
    }

    #[test]
    fn test_no_users_found() {
        let outcome = TenantOutcome {
            tenant: contoso(),
            result: Ok(vec![]),
        };
        let mut errors = Vec::new();
        let text = render(|out| write_outcome(out, &mut errors, &outcome));
        let lines: Vec<&str> = text.lines().collect();

        assert!(errors.is_empty());
        assert_eq!(lines[0], "");
        assert_eq!(lines[1], "=".repeat(110));
        assert_eq!(lines[2], "Contoso (contoso.com)");
        assert_eq!(lines[3], "=".repeat(110));
        assert_eq!(lines[4], "-".repeat(110));
        assert!(lines[5].starts_with("Display Name"));
        assert_eq!(lines[6], "-".repeat(110));
        assert_eq!(lines[7], "No users found");
        assert_eq!(lines.len(), 8);
    }

    #[test]
    fn test_failed_tenant_prints_banner_only() {
        let outcome = TenantOutcome {
            tenant: contoso(),
            result: Err(AppError::Auth(AuthError::CallbackTimeout)),
        };
        let mut errors = Vec::new();
        let text = render(|out| write_outcome(out, &mut errors, &outcome));

        assert_eq!(text.lines().count(), 4);
        assert!(text.contains("Contoso (contoso.com)"));
        assert!(!text.contains("Display Name"));
        assert!(!text.contains("ERROR"));
        assert_eq!(
            String::from_utf8(errors).unwrap(),
            "ERROR: Authentication error: OAuth callback timeout\n"
        );
    }
}
