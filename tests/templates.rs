use djinn::{compile, Map, Object, Value};
use std::sync::Arc;

#[derive(Debug)]
struct TestObject {
    attribute: String,
}

impl Object for TestObject {
    fn field(&self, name: &str) -> Option<Value> {
        match name {
            "attribute" => Some(Value::String(self.attribute.clone())),
            _ => None,
        }
    }
}

fn data() -> Map {
    let mut dict = Map::new();
    dict.insert("foo".into(), "bar".into());

    let mut data = Map::new();
    data.insert(
        "object".into(),
        Value::object(TestObject {
            attribute: "foobar".into(),
        }),
    );
    data.insert("number".into(), Value::Int(123));
    data.insert("string".into(), "barfoo".into());
    data.insert("dict".into(), Value::Map(dict));
    data.insert("list".into(), vec!["foo", "bar", "baz"].into());
    data.insert("true_var".into(), true.into());
    data.insert("false_var".into(), false.into());
    data
}

fn render(template: &str) -> String {
    compile(template).unwrap().render(&data())
}

#[test]
fn empty_template_string() {
    assert_eq!(render(""), "");
}

#[test]
fn template_with_no_tags() {
    assert_eq!(render("no tags"), "no tags");
}

#[test]
fn comment_tag() {
    assert_eq!(render("foo{# this is \n a comment #}bar"), "foobar");
    assert_eq!(render("{# c #}"), "");
}

#[test]
fn print_tag_with_number() {
    assert_eq!(render("{{number}}"), "123");
}

#[test]
fn print_tag_with_string() {
    assert_eq!(render("{{string}}"), "barfoo");
}

#[test]
fn print_tag_with_object() {
    assert_eq!(render("{{object.attribute}}"), "foobar");
}

#[test]
fn print_tag_with_dict() {
    assert_eq!(render("{{dict.foo}}"), "bar");
    assert_eq!(render("{{dict.missing}}"), "");
}

#[test]
fn if_tag_with_true_condition() {
    assert_eq!(render("{% if true_var %}foo{% endif %}"), "foo");
}

#[test]
fn if_tag_with_false_condition() {
    assert_eq!(render("{% if false_var %}foo{% endif %}"), "");
}

#[test]
fn if_else_tag_with_true_condition() {
    assert_eq!(render("{% if true_var %}foo{% else %}bar{% endif %}"), "foo");
}

#[test]
fn if_else_tag_with_false_condition() {
    assert_eq!(render("{% if false_var %}foo{% else %}bar{% endif %}"), "bar");
}

#[test]
fn if_else_tag_with_missing_condition() {
    assert_eq!(render("{% if nothing.here %}foo{% else %}bar{% endif %}"), "bar");
}

#[test]
fn for_tag() {
    assert_eq!(render("{% for var in list %}{{var}}{% endfor %}"), "foobarbaz");
}

#[test]
fn mixed_template() {
    let template = "\
{# header #}Items for {{ object.attribute }}:
{% for item in list %}- {{ item }}{% if true_var %}!{% endif %}
{% endfor %}{% if dict.foo %}dict has foo{% else %}no foo{% endif %}";
    assert_eq!(
        render(template),
        "Items for foobar:\n- foo!\n- bar!\n- baz!\ndict has foo"
    );
}

#[derive(Debug)]
struct Inbox {
    subjects: Vec<&'static str>,
}

impl Object for Inbox {
    fn field(&self, name: &str) -> Option<Value> {
        match name {
            "count" => Some(Value::from(self.subjects.len())),
            _ => None,
        }
    }

    fn iter(&self) -> Option<Vec<Value>> {
        Some(self.subjects.iter().map(|s| Value::from(*s)).collect())
    }

    fn is_truthy(&self) -> bool {
        !self.subjects.is_empty()
    }

    fn render(&self) -> String {
        format!("<inbox of {}>", self.subjects.len())
    }
}

fn render_inbox(template: &str, subjects: Vec<&'static str>) -> String {
    let mut data = Map::new();
    data.insert("inbox".into(), Value::object(Inbox { subjects }));
    compile(template).unwrap().render(&data)
}

#[test]
fn host_object_drives_for_loop() {
    assert_eq!(
        render_inbox("{% for s in inbox %}[{{ s }}]{% endfor %} ({{ inbox.count }})", vec!["hi", "re: hi"]),
        "[hi][re: hi] (2)"
    );
}

#[test]
fn host_object_decides_truthiness() {
    let template = "{% if inbox %}{{ inbox }}{% else %}empty{% endif %}";
    assert_eq!(render_inbox(template, vec![]), "empty");
    assert_eq!(render_inbox(template, vec!["a"]), "<inbox of 1>");
}

#[test]
fn concurrent_renders_share_one_template() {
    let template = Arc::new(compile("{% for v in list %}{{ v }}{{ n }}{% endfor %}").unwrap());
    let handles: Vec<_> = (0..4)
        .map(|n| {
            let template = Arc::clone(&template);
            std::thread::spawn(move || {
                let mut data = data();
                data.insert("n".into(), Value::Int(n));
                template.render(&data)
            })
        })
        .collect();

    for (n, handle) in handles.into_iter().enumerate() {
        assert_eq!(handle.join().unwrap(), format!("foo{n}bar{n}baz{n}"));
    }
}
