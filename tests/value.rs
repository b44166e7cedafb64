#[cfg(test)]
mod value_tests {
    use std::rc::Rc;

    use mython as my;

    use my::ast::Statement;
    use my::error::RuntimeError;
    use my::value::*;

    fn ctx() -> SimpleContext<Vec<u8>> {
        SimpleContext::new(Vec::new())
    }

    /// A method whose whole body is `return <value>`.
    fn returning(name: &str, params: &[&str], value: Statement) -> Method {
        Method::new(
            name,
            params.iter().map(|p| p.to_string()).collect(),
            Statement::method_body(Statement::ret(value)),
        )
    }

    fn instance_of(class: &Rc<Class>) -> Value {
        Value::own(Instance::new(Rc::clone(class)))
    }

    fn parent_and_child() -> (Rc<Class>, Rc<Class>) {
        let parent = Rc::new(Class::new(
            "Parent",
            vec![
                returning("name", &[], Statement::string("parent")),
                returning("inherited", &[], Statement::number(1)),
            ],
            None,
        ));

        let child = Rc::new(Class::new(
            "Child",
            vec![returning("name", &[], Statement::string("child"))],
            Some(Rc::clone(&parent)),
        ));

        (parent, child)
    }

    fn assert_no_comparison<T: std::fmt::Debug>(result: Result<T, RuntimeError>) {
        match result {
            Err(RuntimeError::NoComparison { .. }) => {}
            other => panic!("Expected NoComparison, got {:?}", other),
        }
    }

    #[test]
    fn test_value_01_truthiness() {
        let (_, child) = parent_and_child();

        assert!(Value::number(7).is_true());
        assert!(!Value::number(0).is_true());
        assert!(Value::string("x").is_true());
        assert!(!Value::string("").is_true());
        assert!(Value::boolean(true).is_true());
        assert!(!Value::boolean(false).is_true());
        assert!(!Value::None.is_true());
        assert!(!Value::Class(Rc::clone(&child)).is_true());
        assert!(!instance_of(&child).is_true());
    }

    #[test]
    fn test_value_02_equality() {
        let mut ctx = ctx();

        assert_eq!(equal(&Value::number(1), &Value::number(1), &mut ctx).ok(), Some(true));
        assert_eq!(equal(&Value::number(1), &Value::number(2), &mut ctx).ok(), Some(false));
        assert_eq!(equal(&Value::None, &Value::None, &mut ctx).ok(), Some(true));
        assert_eq!(
            equal(&Value::string("ab"), &Value::string("ab"), &mut ctx).ok(),
            Some(true)
        );
        assert_eq!(
            not_equal(&Value::boolean(true), &Value::boolean(false), &mut ctx).ok(),
            Some(true)
        );

        assert_no_comparison(equal(&Value::number(1), &Value::string("1"), &mut ctx));
        assert_no_comparison(equal(&Value::None, &Value::number(0), &mut ctx));
    }

    #[test]
    fn test_value_03_ordering() {
        let mut ctx = ctx();

        assert_eq!(
            less(&Value::string("a"), &Value::string("b"), &mut ctx).ok(),
            Some(true)
        );
        assert_eq!(
            less(&Value::boolean(false), &Value::boolean(true), &mut ctx).ok(),
            Some(true)
        );
        assert_eq!(greater(&Value::number(3), &Value::number(2), &mut ctx).ok(), Some(true));
        assert_eq!(greater(&Value::number(2), &Value::number(2), &mut ctx).ok(), Some(false));
        assert_eq!(
            less_or_equal(&Value::number(2), &Value::number(2), &mut ctx).ok(),
            Some(true)
        );
        assert_eq!(
            greater_or_equal(&Value::number(1), &Value::number(2), &mut ctx).ok(),
            Some(false)
        );

        assert_no_comparison(less(&Value::None, &Value::None, &mut ctx));
        assert_no_comparison(less(&Value::number(1), &Value::boolean(true), &mut ctx));
    }

    #[test]
    fn test_value_04_user_comparisons() {
        let mut ctx = ctx();

        // Every instance equals everything and is less than nothing.
        let class = Rc::new(Class::new(
            "Weird",
            vec![
                returning("__eq__", &["other"], Statement::boolean(true)),
                returning("__lt__", &["other"], Statement::boolean(false)),
            ],
            None,
        ));
        let obj = instance_of(&class);

        assert_eq!(equal(&obj, &Value::number(5), &mut ctx).ok(), Some(true));
        assert_eq!(less(&obj, &Value::number(5), &mut ctx).ok(), Some(false));
        assert_eq!(greater(&obj, &Value::number(5), &mut ctx).ok(), Some(false));
        assert_eq!(greater_or_equal(&obj, &Value::number(5), &mut ctx).ok(), Some(true));

        // Dunders are looked up on the left operand only.
        assert_no_comparison(equal(&Value::number(5), &obj, &mut ctx));
        assert_no_comparison(less(&obj, &Value::None, &mut ctx));
    }

    #[test]
    fn test_value_05_method_resolution() {
        let mut ctx = ctx();
        let (parent, child) = parent_and_child();

        assert_eq!(child.method("name").map(|m| m.name.as_str()), Some("name"));
        assert!(child.method("inherited").is_some(), "falls back to parent");
        assert!(parent.method("missing").is_none());

        assert!(
            child.parent().is_some_and(|p| Rc::ptr_eq(p, &parent)),
            "child keeps a handle to its parent"
        );
        assert!(parent.parent().is_none());

        let obj = instance_of(&child);
        let instance = obj
            .as_instance()
            .expect("live instance")
            .expect("value is an instance");

        let name = instance.call("name", vec![], &mut ctx).expect("child method");
        assert_eq!(name.as_str(), Some("child"), "child shadows parent");

        let inherited = instance.call("inherited", vec![], &mut ctx).expect("parent method");
        assert_eq!(inherited.as_number(), Some(1));

        assert!(instance.has_method("name", 0));
        assert!(!instance.has_method("name", 1), "arity must match exactly");
        assert!(!instance.has_method("missing", 0));

        match instance.call("missing", vec![], &mut ctx) {
            Err(RuntimeError::NoSuchMethod {
                class,
                method,
                arity,
            }) => {
                assert_eq!(class, "Child");
                assert_eq!(method, "missing");
                assert_eq!(arity, 0);
            }
            other => panic!("Expected NoSuchMethod, got {:?}", other),
        }

        assert!(matches!(
            instance.call("name", vec![Value::number(1)], &mut ctx),
            Err(RuntimeError::NoSuchMethod { arity: 1, .. })
        ));
    }

    #[test]
    fn test_value_06_methods_are_sorted() {
        let class = Class::new(
            "Sorted",
            vec![
                returning("zeta", &[], Statement::none()),
                returning("alpha", &[], Statement::none()),
                returning("mid", &[], Statement::none()),
            ],
            None,
        );

        let names: Vec<&str> = class.methods().iter().map(|m| m.name.as_str()).collect();
        assert_eq!(names, ["alpha", "mid", "zeta"]);
    }

    #[test]
    fn test_value_07_render() {
        let mut ctx = ctx();
        let (_, child) = parent_and_child();

        assert_eq!(Value::None.render(&mut ctx).ok().as_deref(), Some("None"));
        assert_eq!(Value::number(-42).render(&mut ctx).ok().as_deref(), Some("-42"));
        assert_eq!(Value::boolean(true).render(&mut ctx).ok().as_deref(), Some("True"));
        assert_eq!(Value::boolean(false).render(&mut ctx).ok().as_deref(), Some("False"));
        assert_eq!(Value::string("hi").render(&mut ctx).ok().as_deref(), Some("hi"));
        assert_eq!(
            Value::Class(Rc::clone(&child)).render(&mut ctx).ok().as_deref(),
            Some("Class Child")
        );

        let plain = instance_of(&child).render(&mut ctx).expect("render");
        assert!(
            plain.starts_with("<Child object at "),
            "Unexpected identity string: {}",
            plain
        );

        let a = instance_of(&child);
        let b = instance_of(&child);
        assert_ne!(
            a.render(&mut ctx).expect("render"),
            b.render(&mut ctx).expect("render"),
            "distinct live instances render differently"
        );

        let pretty = Rc::new(Class::new(
            "Pretty",
            vec![returning("__str__", &[], Statement::number(7))],
            None,
        ));
        assert_eq!(
            instance_of(&pretty).render(&mut ctx).ok().as_deref(),
            Some("7"),
            "__str__ result is rendered in turn"
        );
    }

    #[test]
    fn test_value_08_borrowed_share() {
        let (_, child) = parent_and_child();
        let owner = Rc::new(Instance::new(Rc::clone(&child)));

        let share = Value::share(&owner);
        assert!(matches!(&share, Value::Instance(handle) if handle.is_borrowed()));
        assert_eq!(Rc::strong_count(&owner), 1, "a share never owns");

        let promoted = share.clone().promote().expect("owner alive");
        assert!(matches!(&promoted, Value::Instance(handle) if !handle.is_borrowed()));
        drop(promoted);

        drop(owner);
        assert!(matches!(share.promote(), Err(RuntimeError::DanglingInstance)));
    }
}
