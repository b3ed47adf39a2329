//! ARCAD instance registry
//!
//! Registered instances live in the `ARCAD_SYS.AARCINSF1` table; each
//! product library carries its version in the `ARCVERSION` data area.

use afsctl_errors::Error;
use afsctl_gateway::RemoteGateway;
use afsctl_types::{ArcadInstance, ArcadVersion, InstanceCode, LibraryName};

use crate::row;

const QUERY: &str = "\
Select INS_JCODE, INS_CTXT, INS_JPRDL, INS_NASPNB, DATA_AREA_VALUE \
From ARCAD_SYS.AARCINSF1 \
Cross Join Table(QSYS2.DATA_AREA_INFO( DATA_AREA_NAME => 'ARCVERSION', DATA_AREA_LIBRARY => INS_JPRDL)) \
Order by INS_JCODE";

/// List every registered ARCAD instance with its product version.
///
/// # Errors
///
/// Returns an error if the registry query fails or a row holds an invalid
/// instance code, library name or version string.
pub async fn list_instances(gateway: &dyn RemoteGateway) -> Result<Vec<ArcadInstance>, Error> {
    let rows = gateway.run_sql(QUERY).await?;
    let mut instances = Vec::with_capacity(rows.len());
    for r in rows {
        instances.push(ArcadInstance {
            code: InstanceCode::new(&row::text(&r, "instances", "INS_JCODE")?)?,
            text: row::text(&r, "instances", "INS_CTXT")?,
            library: LibraryName::new(&row::text(&r, "instances", "INS_JPRDL")?)?,
            // ASP 1 is the system ASP and reads as "no iASP".
            iasp: row::opt_text(&r, "INS_NASPNB").filter(|asp| asp != "1"),
            version: ArcadVersion::parse(&row::text(&r, "instances", "DATA_AREA_VALUE")?)?,
        });
    }
    Ok(instances)
}

/// The set of instance codes already taken, used to validate a new install.
///
/// # Errors
///
/// Returns an error if the registry query fails.
pub async fn list_instance_codes(gateway: &dyn RemoteGateway) -> Result<Vec<InstanceCode>, Error> {
    Ok(list_instances(gateway)
        .await?
        .into_iter()
        .map(|instance| instance.code)
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use afsctl_gateway::testing::ScriptedGateway;
    use serde_json::json;

    #[tokio::test]
    async fn maps_registry_rows_to_instances() {
        let gateway = ScriptedGateway::new();
        gateway.respond_sql(
            "AARCINSF1",
            vec![
                json!({
                    "INS_JCODE": "AD",
                    "INS_CTXT": "Development   ",
                    "INS_JPRDL": "ARCAD_PRD ",
                    "INS_NASPNB": "1",
                    "DATA_AREA_VALUE": "24.00.12"
                }),
                json!({
                    "INS_JCODE": "T1",
                    "INS_CTXT": "Test",
                    "INS_JPRDL": "ARCAD_TST",
                    "INS_NASPNB": "33",
                    "DATA_AREA_VALUE": "23.10.05"
                }),
            ]
            .into_iter()
            .map(|v| v.as_object().unwrap().clone())
            .collect(),
        );

        let instances = list_instances(&gateway).await.unwrap();
        assert_eq!(instances.len(), 2);
        assert_eq!(instances[0].code.as_str(), "AD");
        assert_eq!(instances[0].iasp, None);
        assert_eq!(instances[0].version.to_string(), "24.00.12");
        assert_eq!(instances[1].iasp.as_deref(), Some("33"));
        assert_eq!(instances[1].library.as_str(), "ARCAD_TST");

        let codes = list_instance_codes(&gateway).await.unwrap();
        assert_eq!(codes.len(), 2);
        assert_eq!(codes[1].as_str(), "T1");
    }

    #[tokio::test]
    async fn invalid_instance_code_is_an_error() {
        let gateway = ScriptedGateway::new();
        gateway.respond_sql(
            "AARCINSF1",
            vec![json!({
                "INS_JCODE": "toolong",
                "INS_CTXT": "",
                "INS_JPRDL": "LIB",
                "INS_NASPNB": "1",
                "DATA_AREA_VALUE": "24.00.12"
            })
            .as_object()
            .unwrap()
            .clone()],
        );
        assert!(list_instances(&gateway).await.is_err());
    }
}
