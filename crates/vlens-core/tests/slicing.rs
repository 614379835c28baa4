use pretty_assertions::assert_eq;
use vlens_core::{
    check_module, fields_read, slice_all, synthesize_put, FieldMap, LensTable, RewriteError, SliceConfig, SliceError,
};
use vlens_syntax::ast::Expr;
use vlens_syntax::visit::{walk_body_mut, walk_expr_mut, VisitorMut};
use vlens_syntax::{parse_module, print_class};
use vlens_test_utils::{class_model, module_model, slice_source, CHAIN, DIAMOND, POINT};

#[test]
fn point_sliced_at_2_routes_fields_through_lenses() {
    let out = slice_source(POINT, "2", &SliceConfig::default()).unwrap();
    assert_eq!(
        out,
        r#"class Point:
    def __init__(self, y):
        self.y = y

    def bump(self):
        self.y = self._lens_put_y_1_2(x=self._lens_get_x_2_1() + 1)
        return self._lens_get_x_2_1()

    def load(self, pair):
        _vl_tmp0 = parse(pair)
        self.y = self._lens_put_y_1_2(x=_vl_tmp0[0])
        label = _vl_tmp0[1]
        return label

    def _lens_get_x_2_1(self):
        return int(self.y)

    def _lens_put_y_1_2(self, x):
        return str(x)
"#
    );
}

#[test]
fn slicing_at_the_declaring_version_is_identity() {
    let out = slice_source(POINT, "1", &SliceConfig::default()).unwrap();
    assert_eq!(
        out,
        r#"class Point:
    def __init__(self, x):
        self.x = x

    def bump(self):
        self.x += 1
        return self.x

    def load(self, pair):
        self.x, label = parse(pair)
        return label
"#
    );
}

#[test]
fn sliced_output_parses_and_reslices_unchanged() {
    let first = slice_source(POINT, "2", &SliceConfig::default()).unwrap();
    let reparsed = parse_module(&first).unwrap();
    assert_eq!(print_class(reparsed.classes().next().unwrap()), first);
}

#[test]
fn multi_hop_composes_lens_by_lens() {
    let out = slice_source(CHAIN, "C", &SliceConfig::default()).unwrap();
    assert_eq!(
        out,
        r#"class Chain:
    def __init__(self):
        self.f = [1]

    def show(self):
        return self._lens_get_f_B_A()

    def _lens_get_f_C_B(self):
        return str(self.f[0])

    def _lens_get_f_B_A(self):
        return int(self._lens_get_f_C_B())
"#
    );
}

#[test]
fn multi_hop_write_nests_puts() {
    let src = r#"
@version("A")
@version("B")
@version("C", replaces=["A"])
class Relay:
    @at("A")
    def __init__(self):
        self.f = 1

    @at("B")
    def __init__(self):
        self.f = "1"

    @at("C")
    def __init__(self):
        self.f = [1]

    @at("A")
    def set(self, v):
        self.f = v

    @get("B", "A", "f")
    def a_from_b(self):
        return int(self.f)

    @get("C", "B", "f")
    def b_from_c(self):
        return str(self.f[0])

    @get("A", "B", "f")
    def b_from_a(self):
        return str(self.f)

    @get("B", "C", "f")
    def c_from_b(self):
        return [int(self.f)]
"#;
    let out = slice_source(src, "C", &SliceConfig::default()).unwrap();
    assert_eq!(
        out,
        r#"class Relay:
    def __init__(self):
        self.f = [1]

    def set(self, v):
        self.f = self._lens_put_f_B_C(f=self._lens_put_f_A_B(f=v))

    def _lens_put_f_A_B(self, f):
        return str(f)

    def _lens_put_f_B_C(self, f):
        return [int(f)]
"#
    );
}

#[test]
fn put_receives_every_field_its_get_reads() {
    let src = r#"
@version("1")
@version("2", replaces=["1"])
class Ledger:
    @at("1")
    def __init__(self):
        self.amount = 0
        self.cur = None

    @at("2")
    def __init__(self):
        self.label = None

    @at("1")
    def charge(self, v):
        self.amount = compute(v)

    @get("1", "2", "label")
    def label_of(self):
        return fmt(self.amount, self.cur)

    @get("2", "1", "amount")
    def amount_of(self):
        return parse_amount(self.label)

    @get("2", "1", "cur")
    def cur_of(self):
        return parse_cur(self.label)
"#;
    let out = slice_source(src, "2", &SliceConfig::default()).unwrap();
    assert_eq!(
        out,
        r#"class Ledger:
    def __init__(self):
        self.label = None

    def charge(self, v):
        self.label = self._lens_put_label_1_2(amount=compute(v), cur=self._lens_get_cur_2_1())

    def _lens_put_label_1_2(self, amount, cur):
        return fmt(amount, cur)

    def _lens_get_cur_2_1(self):
        return parse_cur(self.label)
"#
    );
}

#[test]
fn hop_ceiling_stops_long_chains() {
    let src = r#"
@version("A")
@version("B")
@version("C")
@version("D", replaces=["A"])
class Long:
    @at("A")
    def __init__(self):
        self.f = 0

    @at("B")
    def __init__(self):
        self.f = 0

    @at("C")
    def __init__(self):
        self.f = 0

    @at("D")
    def __init__(self):
        self.f = 0

    @at("A")
    def show(self):
        return self.f

    @get("B", "A", "f")
    def a(self):
        return self.f

    @get("C", "B", "f")
    def b(self):
        return self.f

    @get("D", "C", "f")
    def c(self):
        return self.f
"#;
    assert!(slice_source(src, "D", &SliceConfig::default()).is_ok());
    let err = slice_source(src, "D", &SliceConfig::default().with_max_lens_hops(1)).unwrap_err();
    assert!(
        matches!(
            err,
            SliceError::Rewrite {
                source: RewriteError::LensHopLimit { limit: 1, .. },
                ..
            }
        ),
        "{err}"
    );
}

#[test]
fn cyclic_composition_is_reported() {
    let src = r#"
@version("A")
@version("B")
@version("C", replaces=["A"])
class Loop:
    @at("A")
    def __init__(self):
        self.f = 0

    @at("B")
    def __init__(self):
        self.f = 0

    @at("C")
    def __init__(self):
        self.h = 0

    @at("A")
    def show(self):
        return self.f

    @get("B", "A", "f")
    def a_from_b(self):
        return self.f

    @get("A", "B", "f")
    def b_from_a(self):
        return self.f

    @get("C", "A", "g")
    def g_from_c(self):
        return self.h
"#;
    let err = slice_source(src, "C", &SliceConfig::default()).unwrap_err();
    assert!(
        matches!(
            err,
            SliceError::Rewrite {
                source: RewriteError::LensCycle { ref field, ref version },
                ..
            } if field == "f" && version == "A"
        ),
        "{err}"
    );
}

#[test]
fn ambiguous_member_fails_the_slice() {
    let err = slice_source(DIAMOND, "Z", &SliceConfig::default()).unwrap_err();
    assert_eq!(
        err,
        SliceError::AmbiguousResolution {
            class: "Diamond".into(),
            member: "m".into(),
            version: "Z".into(),
            candidates: vec!["X".into(), "Y".into()],
        }
    );
    assert!(slice_source(DIAMOND, "X", &SliceConfig::default()).is_ok());
}

#[test]
fn checker_reports_the_same_ambiguity() {
    let diags = check_module(&parse_module(DIAMOND).unwrap(), &SliceConfig::default());
    assert_eq!(diags.len(), 1);
    assert_eq!(diags[0].version.as_deref(), Some("Z"));
}

#[test]
fn slice_table_holds_every_class_version() {
    let table = slice_all(&module_model(POINT), &SliceConfig::default()).unwrap();
    assert_eq!(table.len(), 2);
    let at_2 = print_class(table.get("Point", "2").unwrap());
    assert_eq!(at_2, slice_source(POINT, "2", &SliceConfig::default()).unwrap());
}

#[test]
fn synthesized_put_inverts_its_get_structurally() {
    struct FieldsBack<'a>(&'a [String]);

    impl VisitorMut for FieldsBack<'_> {
        fn visit_expr_mut(&mut self, expr: &mut Expr) {
            let field = match &*expr {
                Expr::Name(id) if self.0.contains(id) => Some(id.clone()),
                _ => None,
            };
            match field {
                Some(f) => *expr = Expr::attr(Expr::name("self"), f),
                None => walk_expr_mut(self, expr),
            }
        }
    }

    let class = class_model(POINT);
    let fields = FieldMap::new(&class);
    let table = LensTable::new(&class, &fields);
    let g = class.graph();
    let (v1, v2) = (g.id("1").unwrap(), g.id("2").unwrap());

    let get = table.get(v2, "y", v1).unwrap();
    let put = synthesize_put(fields.fields(v1), get);
    let reads = fields_read(fields.fields(v1), &get.def);
    assert_eq!(reads, vec!["x"]);

    let mut body = put.def.body.clone();
    walk_body_mut(&mut FieldsBack(&reads), &mut body);
    assert_eq!(body, get.def.body);
}
