use anyhow::Result;
use monadflow::{FlowError, NewType};

fn email() -> NewType<String> {
    NewType::new("Email")
        .converter(|s: String| s.trim().to_string())
        .converter(|s: String| s.to_lowercase())
        .validator("has_at", |s: &String| s.contains('@'))
        .validator("has_domain", |s: &String| s.rsplit('@').next().is_some_and(|d| d.contains('.')))
}

#[test]
fn converters_run_before_validators() -> Result<()> {
    let e = email().create("  Someone@Example.COM ".to_string())?;
    assert_eq!(e.value(), "someone@example.com");
    assert_eq!(e.name(), "Email");
    assert_eq!(format!("{e:?}"), "Email(\"someone@example.com\")");
    Ok(())
}

#[test]
fn first_failing_validator_is_reported() {
    let err = email().create("no-at-sign".to_string()).unwrap_err();
    assert_eq!(
        err,
        FlowError::Validation {
            type_name: "Email",
            validator: "has_at",
            value: "\"no-at-sign\"".to_string(),
        }
    );

    let err = email().create("a@localhost".to_string()).unwrap_err();
    assert!(matches!(err, FlowError::Validation { validator: "has_domain", .. }));
    assert_eq!(
        err.to_string(),
        "Email does not return true for `has_domain`, received `\"a@localhost\"`"
    );
}

#[test]
fn map_revalidates() -> Result<()> {
    let e = email().create("a@b.io".to_string())?;
    let renamed = e.clone().map(|s| s.replace("a@", "ADMIN@"))?;
    assert_eq!(renamed.value(), "admin@b.io");
    assert!(e.map(|s| s.replace('@', "")).is_err());
    Ok(())
}

#[test]
fn equality_uses_name_and_value() -> Result<()> {
    let pos = NewType::<i64>::new("Positive").validator("gt_zero", |x: &i64| *x > 0);
    let id = NewType::<i64>::new("Id");
    assert_eq!(pos.create(3)?, pos.create(3)?);
    assert_ne!(pos.create(3)?, id.create(3)?);
    assert_eq!(pos.create(3)?.into_inner(), 3);
    assert!(pos.create(0).is_err());
    Ok(())
}

#[test]
fn specs_are_shareable() -> Result<()> {
    let base = NewType::<i32>::new("Small").validator("lt_100", |x: &i32| *x < 100);
    let stricter = base.clone().validator("even", |x: &i32| x % 2 == 0);
    assert!(base.create(3).is_ok());
    assert!(stricter.create(3).is_err());
    assert_eq!(stricter.create(4)?.value(), &4);
    Ok(())
}
