use crate::{
    common,
    error::{Error, Result},
    schema::attribute::Attribute,
};

use indexmap::IndexMap;
use serde_json::Value;
use std::{collections, fmt, ops, sync::Arc};

/// Filter names that would shadow the terminal methods of a chain.
pub const RESERVED_FILTER_NAMES: [&str; 3] = ["go", "params", "filter"];

/// Logical operator for combining conditions.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum LogicalOperator {
    /// Logical AND - all conditions must be true.
    And,
    /// Logical OR - at least one condition must be true.
    Or,
}

impl ops::Deref for LogicalOperator {
    type Target = str;

    fn deref(&self) -> &Self::Target {
        match self {
            Self::And => " AND ",
            Self::Or => " OR ",
        }
    }
}

/// Comparison applied to a single attribute.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum Operator {
    /// Checks if an attribute begins with a specified prefix.
    BeginsWith,
    /// Checks if an attribute value is between two values (inclusive).
    Between,
    /// Checks if an attribute contains a specified value.
    Contains,
    /// Checks if an attribute value equals a specified value.
    Eq,
    /// Checks if an attribute exists.
    Exists,
    /// Checks if an attribute value is greater than a specified value.
    Gt,
    /// Checks if an attribute value is greater than or equal to a specified value.
    Gte,
    /// Checks if an attribute value is less than a specified value.
    Lt,
    /// Checks if an attribute value is less than or equal to a specified value.
    Lte,
    /// Checks if an attribute value does not equal a specified value.
    Ne,
    /// Checks if an attribute does not contain a specified value.
    NotContains,
    /// Checks if an attribute does not exist.
    NotExists,
}

impl Operator {
    fn arity(self) -> usize {
        match self {
            Self::Exists | Self::NotExists => 0,
            Self::Between => 2,
            _ => 1,
        }
    }

    fn render(self, name: &str, values: &[String]) -> String {
        match (self, values) {
            (Self::BeginsWith, [value]) => format!("begins_with({name}, {value})"),
            (Self::Between, [start, end]) => format!("({name} between {start} and {end})"),
            (Self::Contains, [value]) => format!("contains({name}, {value})"),
            (Self::Eq, [value]) => format!("{name} = {value}"),
            (Self::Gt, [value]) => format!("{name} > {value}"),
            (Self::Gte, [value]) => format!("{name} >= {value}"),
            (Self::Lt, [value]) => format!("{name} < {value}"),
            (Self::Lte, [value]) => format!("{name} <= {value}"),
            (Self::Ne, [value]) => format!("{name} <> {value}"),
            (Self::NotContains, [value]) => format!("not contains({name}, {value})"),
            (Self::NotExists, _) => format!("attribute_not_exists({name})"),
            (_, _) => format!("attribute_exists({name})"),
        }
    }
}

/// Boolean expression tree produced by filter functions.
///
/// ```rust
/// use dynamodb_facet::common::condition;
///
/// let attributes = condition::FilterAttributes::default();
/// let rent = attributes.attribute("rent");
/// let mall = attributes.attribute("mall");
/// let expression = rent.gte("20.00").and(mall.eq("EastPointe")).group();
/// assert!(matches!(expression, condition::FilterExpression::Group(_)));
/// ```
#[derive(Clone, Debug, PartialEq)]
pub enum FilterExpression {
    /// A comparison on one attribute.
    Condition {
        /// The attribute name.
        attribute: String,
        /// The comparison.
        operator: Operator,
        /// The compared values, as many as the operator takes.
        operands: Vec<Value>,
    },
    /// Parenthesized sub-expression.
    Group(Box<FilterExpression>),
    /// Sub-expressions combined with a logical operator.
    Logical(LogicalOperator, Vec<FilterExpression>),
}

impl FilterExpression {
    fn combine(self, operator: LogicalOperator, other: Self) -> Self {
        match self {
            Self::Logical(current, mut expressions) if current == operator => {
                expressions.push(other);
                Self::Logical(operator, expressions)
            }
            expression => Self::Logical(operator, vec![expression, other]),
        }
    }

    /// Combine with another expression using AND.
    pub fn and(self, other: Self) -> Self {
        self.combine(LogicalOperator::And, other)
    }

    /// Combine with another expression using OR.
    pub fn or(self, other: Self) -> Self {
        self.combine(LogicalOperator::Or, other)
    }

    /// Wrap the expression in parentheses.
    pub fn group(self) -> Self {
        Self::Group(Box::new(self))
    }

    /// Combine every expression using AND.
    pub fn all(expressions: Vec<Self>) -> Self {
        Self::Logical(LogicalOperator::And, expressions)
    }

    /// Combine every expression using OR.
    pub fn any(expressions: Vec<Self>) -> Self {
        Self::Logical(LogicalOperator::Or, expressions)
    }
}

/// Operator surface of one attribute, handed to filter functions.
#[derive(Clone, Debug)]
pub struct AttributeRef {
    name: String,
}

impl AttributeRef {
    fn condition(&self, operator: Operator, operands: Vec<Value>) -> FilterExpression {
        FilterExpression::Condition {
            attribute: self.name.clone(),
            operator,
            operands,
        }
    }

    /// `#a = :a<n>`
    pub fn eq(&self, value: impl Into<Value>) -> FilterExpression {
        self.condition(Operator::Eq, vec![value.into()])
    }

    /// `#a <> :a<n>`
    pub fn ne(&self, value: impl Into<Value>) -> FilterExpression {
        self.condition(Operator::Ne, vec![value.into()])
    }

    /// `#a > :a<n>`
    pub fn gt(&self, value: impl Into<Value>) -> FilterExpression {
        self.condition(Operator::Gt, vec![value.into()])
    }

    /// `#a >= :a<n>`
    pub fn gte(&self, value: impl Into<Value>) -> FilterExpression {
        self.condition(Operator::Gte, vec![value.into()])
    }

    /// `#a < :a<n>`
    pub fn lt(&self, value: impl Into<Value>) -> FilterExpression {
        self.condition(Operator::Lt, vec![value.into()])
    }

    /// `#a <= :a<n>`
    pub fn lte(&self, value: impl Into<Value>) -> FilterExpression {
        self.condition(Operator::Lte, vec![value.into()])
    }

    /// `(#a between :a<n> and :a<n+1>)`
    pub fn between(&self, start: impl Into<Value>, end: impl Into<Value>) -> FilterExpression {
        self.condition(Operator::Between, vec![start.into(), end.into()])
    }

    /// `begins_with(#a, :a<n>)`
    pub fn begins_with(&self, value: impl Into<Value>) -> FilterExpression {
        self.condition(Operator::BeginsWith, vec![value.into()])
    }

    /// `contains(#a, :a<n>)`
    pub fn contains(&self, value: impl Into<Value>) -> FilterExpression {
        self.condition(Operator::Contains, vec![value.into()])
    }

    /// `not contains(#a, :a<n>)`
    pub fn not_contains(&self, value: impl Into<Value>) -> FilterExpression {
        self.condition(Operator::NotContains, vec![value.into()])
    }

    /// `attribute_exists(#a)`
    pub fn exists(&self) -> FilterExpression {
        self.condition(Operator::Exists, Vec::new())
    }

    /// `attribute_not_exists(#a)`
    pub fn not_exists(&self) -> FilterExpression {
        self.condition(Operator::NotExists, Vec::new())
    }
}

/// The attributes of an entity, as seen by filter functions.
///
/// Any name can be referenced; unknown names are rejected when the expression is compiled.
#[derive(Clone, Copy, Debug, Default)]
pub struct FilterAttributes<'a> {
    attributes: Option<&'a IndexMap<String, Attribute>>,
}

impl<'a> FilterAttributes<'a> {
    pub(crate) fn new(attributes: &'a IndexMap<String, Attribute>) -> Self {
        Self {
            attributes: Some(attributes),
        }
    }

    /// The operator surface of an attribute.
    pub fn attribute(&self, name: &str) -> AttributeRef {
        AttributeRef {
            name: name.to_string(),
        }
    }

    /// The names of the entity attributes, in declaration order.
    pub fn names(&self) -> impl Iterator<Item = &'a str> {
        self.attributes
            .into_iter()
            .flat_map(|attributes| attributes.keys().map(String::as_str))
    }

    fn field(&self, name: &str) -> Result<&'a str> {
        self.attributes
            .and_then(|attributes| attributes.get(name))
            .map(|attribute| attribute.field.as_str())
            .ok_or_else(|| Error::invalid_attribute(name, "not defined in the entity schema"))
    }
}

type FilterFn = dyn Fn(&FilterAttributes<'_>, &[Value]) -> FilterExpression + Send + Sync;

/// A named, reusable filter registered with the entity schema.
///
/// The function receives the attribute surface and the positional arguments given when the
/// filter is applied; arguments are not checked against the attribute types.
#[derive(Clone)]
pub struct CustomFilter(Arc<FilterFn>);

impl CustomFilter {
    /// Wrap a filter function.
    pub fn new<F>(filter: F) -> Self
    where
        F: Fn(&FilterAttributes<'_>, &[Value]) -> FilterExpression + Send + Sync + 'static,
    {
        Self(Arc::new(filter))
    }

    /// Build the clause with the given arguments and compile it onto `state`.
    pub fn clause(
        &self,
        state: ClauseState,
        attributes: FilterAttributes<'_>,
        args: &[Value],
    ) -> Result<ClauseState> {
        let expression = (self.0)(&attributes, args);
        state.apply(&expression, attributes)
    }
}

impl fmt::Debug for CustomFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("CustomFilter")
    }
}

/// Accumulator threaded through successive clauses of one chain.
///
/// Placeholder counters persist across clauses, so an attribute referenced by several clauses
/// never reuses a value placeholder.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ClauseState {
    clauses: Vec<String>,
    names: IndexMap<String, String>,
    value_count: collections::HashMap<String, usize>,
    values: IndexMap<String, Value>,
}

impl ClauseState {
    /// Compile an expression and append it as a new clause.
    pub fn apply(
        mut self,
        expression: &FilterExpression,
        attributes: FilterAttributes<'_>,
    ) -> Result<Self> {
        let clause = self.compile(expression, &attributes)?;
        if !clause.is_empty() {
            self.clauses.push(clause);
        }
        Ok(self)
    }

    /// The combined expression: a single clause as is, several parenthesized and AND-joined.
    pub fn expression(&self) -> Option<String> {
        match self.clauses.as_slice() {
            [] => None,
            [clause] => Some(clause.clone()),
            clauses => {
                let clauses: Vec<_> = clauses.iter().map(|clause| format!("({clause})")).collect();
                Some(clauses.join(&*LogicalOperator::And))
            }
        }
    }

    /// Whether no clause was applied.
    pub fn is_empty(&self) -> bool {
        self.clauses.is_empty()
    }

    /// Name placeholders and the physical fields they stand for.
    pub fn names(&self) -> &IndexMap<String, String> {
        &self.names
    }

    /// Value placeholders and their values.
    pub fn values(&self) -> &IndexMap<String, Value> {
        &self.values
    }

    /// The last value placeholder suffix minted for an attribute.
    pub fn value_count(&self, attribute: &str) -> usize {
        self.value_count.get(attribute).copied().unwrap_or_default()
    }

    pub(crate) fn into_expression_input(self) -> Option<common::ExpressionInput> {
        let expression = self.expression()?;
        let input = common::ExpressionInput {
            expression,
            expression_attribute_names: self.names,
            expression_attribute_values: self.values,
        };
        Some(input)
    }

    fn mint(&mut self, attribute: &str, value: Value) -> String {
        let count = self.value_count.entry(attribute.to_string()).or_default();
        let placeholder = loop {
            *count += 1;
            let placeholder = common::value_placeholder(&format!("{attribute}{count}"));
            if !self.values.contains_key(&placeholder) {
                break placeholder;
            }
        };
        self.values.insert(placeholder.clone(), value);
        placeholder
    }

    fn compile(
        &mut self,
        expression: &FilterExpression,
        attributes: &FilterAttributes<'_>,
    ) -> Result<String> {
        match expression {
            FilterExpression::Condition {
                attribute,
                operator,
                operands,
            } => {
                let field = attributes.field(attribute)?;
                if operands.len() != operator.arity() {
                    return Err(Error::invalid_attribute(
                        attribute,
                        format!(
                            "{operator:?} takes {} operands, received {}",
                            operator.arity(),
                            operands.len()
                        ),
                    ));
                }
                let name = common::name_placeholder(attribute);
                self.names
                    .entry(name.clone())
                    .or_insert_with(|| field.to_string());
                let values: Vec<_> = operands
                    .iter()
                    .map(|operand| self.mint(attribute, operand.clone()))
                    .collect();
                Ok(operator.render(&name, &values))
            }
            FilterExpression::Group(expression) => {
                let expression = self.compile(expression, attributes)?;
                if expression.is_empty() {
                    return Ok(expression);
                }
                Ok(format!("({expression})"))
            }
            FilterExpression::Logical(operator, expressions) => {
                let mut compiled = Vec::with_capacity(expressions.len());
                for expression in expressions {
                    // AND binds tighter than OR: the other operator keeps its parentheses.
                    let nested = matches!(
                        expression,
                        FilterExpression::Logical(inner, parts) if inner != operator && parts.len() > 1
                    );
                    let expression = self.compile(expression, attributes)?;
                    if expression.is_empty() {
                        continue;
                    }
                    if nested {
                        compiled.push(format!("({expression})"));
                    } else {
                        compiled.push(expression);
                    }
                }
                Ok(compiled.join(&**operator))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{entity::Entity, fixtures::mall_stores};

    use rstest::rstest;
    use serde_json::json;

    fn rents_lease_end_filter(attributes: &FilterAttributes<'_>, args: &[Value]) -> FilterExpression {
        let rent = attributes.attribute("rent");
        let mall = attributes.attribute("mall");
        let lease_end = attributes.attribute("leaseEnd");
        rent.gte(args[0].clone())
            .and(mall.eq(args[3].clone()))
            .group()
            .or(lease_end.between(args[1].clone(), args[2].clone()))
    }

    #[rstest]
    fn test_build_clause(mall_stores: Entity) {
        let clause = CustomFilter::new(rents_lease_end_filter);
        let args = [json!("20.00"), json!("20200101"), json!("20200401"), json!("EastPointe")];
        let state = clause
            .clause(ClauseState::default(), mall_stores.filter_attributes(), &args)
            .unwrap();
        assert_eq!(
            state.expression().unwrap(),
            "(#rent >= :rent1 AND #mall = :mall1) OR (#leaseEnd between :leaseEnd1 and :leaseEnd2)"
        );
        assert_eq!(
            state.names(),
            &IndexMap::from([
                ("#rent".to_string(), "rent".to_string()),
                ("#mall".to_string(), "mallId".to_string()),
                ("#leaseEnd".to_string(), "leaseEnd".to_string()),
            ])
        );
        assert_eq!(
            state.values(),
            &IndexMap::from([
                (":rent1".to_string(), json!("20.00")),
                (":mall1".to_string(), json!("EastPointe")),
                (":leaseEnd1".to_string(), json!("20200101")),
                (":leaseEnd2".to_string(), json!("20200401")),
            ])
        );
        assert_eq!(state.value_count("rent"), 1);
        assert_eq!(state.value_count("leaseEnd"), 2);
        assert_eq!(state.value_count("unit"), 0);
    }

    #[rstest]
    #[case::eq(|a: &AttributeRef| a.eq("x"), "#rent = :rent1")]
    #[case::ne(|a: &AttributeRef| a.ne("x"), "#rent <> :rent1")]
    #[case::gt(|a: &AttributeRef| a.gt("x"), "#rent > :rent1")]
    #[case::gte(|a: &AttributeRef| a.gte("x"), "#rent >= :rent1")]
    #[case::lt(|a: &AttributeRef| a.lt("x"), "#rent < :rent1")]
    #[case::lte(|a: &AttributeRef| a.lte("x"), "#rent <= :rent1")]
    #[case::between(|a: &AttributeRef| a.between("x", "y"), "(#rent between :rent1 and :rent2)")]
    #[case::begins_with(|a: &AttributeRef| a.begins_with("x"), "begins_with(#rent, :rent1)")]
    #[case::contains(|a: &AttributeRef| a.contains("x"), "contains(#rent, :rent1)")]
    #[case::not_contains(|a: &AttributeRef| a.not_contains("x"), "not contains(#rent, :rent1)")]
    #[case::exists(|a: &AttributeRef| a.exists(), "attribute_exists(#rent)")]
    #[case::not_exists(|a: &AttributeRef| a.not_exists(), "attribute_not_exists(#rent)")]
    fn test_operators(
        mall_stores: Entity,
        #[case] build: fn(&AttributeRef) -> FilterExpression,
        #[case] expected: &str,
    ) {
        let attributes = mall_stores.filter_attributes();
        let expression = build(&attributes.attribute("rent"));
        let state = ClauseState::default().apply(&expression, attributes).unwrap();
        assert_eq!(state.expression().unwrap(), expected);
        assert_eq!(state.names().len(), 1);
    }

    #[rstest]
    fn test_enum_attribute_is_not_type_checked(mall_stores: Entity) {
        let by_category = CustomFilter::new(|attributes, args| {
            attributes.attribute("category").contains(args[0].clone())
        });
        let state = by_category
            .clause(
                ClauseState::default(),
                mall_stores.filter_attributes(),
                &[json!("food")],
            )
            .unwrap();
        assert_eq!(state.expression().unwrap(), "contains(#category, :category1)");
        assert_eq!(
            state.values(),
            &IndexMap::from([(":category1".to_string(), json!("food"))])
        );
    }

    #[rstest]
    fn test_placeholders_never_collide(mall_stores: Entity) {
        let attributes = mall_stores.filter_attributes();
        let rent = attributes.attribute("rent");
        let state = ClauseState::default()
            .apply(&rent.gte("20.00"), attributes)
            .unwrap()
            .apply(&rent.lte("50.00"), attributes)
            .unwrap();
        assert_eq!(
            state.expression().unwrap(),
            "(#rent >= :rent1) AND (#rent <= :rent2)"
        );
        assert_eq!(
            state.values(),
            &IndexMap::from([
                (":rent1".to_string(), json!("20.00")),
                (":rent2".to_string(), json!("50.00")),
            ])
        );
        assert_eq!(state.names().len(), 1);
    }

    #[test]
    fn test_suffixed_attribute_names_never_collide() {
        let schema = serde_json::from_value(json!({
            "service": "s",
            "entity": "e",
            "table": "t",
            "version": "1",
            "attributes": {"id": {}, "rent": {}, "rent1": {}},
            "indexes": {"record": {"pk": {"field": "pk", "facets": ["id"]}}},
        }))
        .unwrap();
        let entity = Entity::new(schema).unwrap();
        let attributes = entity.filter_attributes();
        let suffixed = attributes.attribute("rent1").eq("a");
        let plain: Vec<_> = (0..11)
            .map(|n| attributes.attribute("rent").ne(n.to_string()))
            .collect();
        let state = ClauseState::default()
            .apply(&suffixed, attributes)
            .unwrap()
            .apply(&FilterExpression::all(plain), attributes)
            .unwrap();
        assert_eq!(state.values().len(), 12);
        assert_eq!(state.values()[":rent11"], json!("a"));
        assert_eq!(state.values()[":rent12"], json!("10"));
        assert_eq!(state.value_count("rent"), 12);
    }

    #[rstest]
    fn test_any_and_all(mall_stores: Entity) {
        let attributes = mall_stores.filter_attributes();
        let color = attributes.attribute("category");
        let unit = attributes.attribute("unit");
        let expression = FilterExpression::all(vec![
            FilterExpression::any(vec![color.not_contains("food"), unit.contains("weird_value")])
                .group(),
            unit.exists(),
        ]);
        let state = ClauseState::default().apply(&expression, attributes).unwrap();
        assert_eq!(
            state.expression().unwrap(),
            "(not contains(#category, :category1) OR contains(#unit, :unit1)) AND attribute_exists(#unit)"
        );
    }

    #[rstest]
    #[case::or_then_and(
        |rent: AttributeRef, mall: AttributeRef, id: AttributeRef| rent.gte("1").or(mall.eq("x")).and(id.exists()),
        "(#rent >= :rent1 OR #mall = :mall1) AND attribute_exists(#id)"
    )]
    #[case::and_then_or(
        |rent: AttributeRef, mall: AttributeRef, id: AttributeRef| rent.gte("1").and(mall.eq("x")).or(id.exists()),
        "(#rent >= :rent1 AND #mall = :mall1) OR attribute_exists(#id)"
    )]
    #[case::all_of_any(
        |rent: AttributeRef, mall: AttributeRef, id: AttributeRef| FilterExpression::all(vec![
            FilterExpression::any(vec![rent.gte("1"), mall.eq("x")]),
            id.exists(),
        ]),
        "(#rent >= :rent1 OR #mall = :mall1) AND attribute_exists(#id)"
    )]
    #[case::any_of_all(
        |rent: AttributeRef, mall: AttributeRef, id: AttributeRef| FilterExpression::any(vec![
            id.not_exists(),
            FilterExpression::all(vec![rent.gte("1"), mall.eq("x")]),
        ]),
        "attribute_not_exists(#id) OR (#rent >= :rent1 AND #mall = :mall1)"
    )]
    #[case::same_operator_flattens(
        |rent: AttributeRef, mall: AttributeRef, id: AttributeRef| FilterExpression::all(vec![
            FilterExpression::all(vec![rent.gte("1"), mall.eq("x")]),
            id.exists(),
        ]),
        "#rent >= :rent1 AND #mall = :mall1 AND attribute_exists(#id)"
    )]
    #[case::single_nested_operand(
        |rent: AttributeRef, _mall: AttributeRef, id: AttributeRef| FilterExpression::all(vec![
            FilterExpression::any(vec![rent.gte("1")]),
            id.exists(),
        ]),
        "#rent >= :rent1 AND attribute_exists(#id)"
    )]
    fn test_mixed_operators_keep_precedence(
        mall_stores: Entity,
        #[case] build: fn(AttributeRef, AttributeRef, AttributeRef) -> FilterExpression,
        #[case] expected: &str,
    ) {
        let attributes = mall_stores.filter_attributes();
        let expression = build(
            attributes.attribute("rent"),
            attributes.attribute("mall"),
            attributes.attribute("id"),
        );
        let state = ClauseState::default().apply(&expression, attributes).unwrap();
        assert_eq!(state.expression().unwrap(), expected);
    }

    #[rstest]
    #[case::empty_all(FilterExpression::all(Vec::new()))]
    #[case::empty_group(FilterExpression::all(Vec::new()).group())]
    #[case::nested_empty_groups(FilterExpression::any(vec![
        FilterExpression::all(Vec::new()).group(),
        FilterExpression::all(Vec::new()),
    ]))]
    fn test_empty_expression_adds_no_clause(
        mall_stores: Entity,
        #[case] expression: FilterExpression,
    ) {
        let state = ClauseState::default()
            .apply(&expression, mall_stores.filter_attributes())
            .unwrap();
        assert!(state.is_empty());
        assert_eq!(state.expression(), None);
    }

    #[rstest]
    #[case::unknown_attribute(
        FilterExpression::Condition {
            attribute: "color".to_string(),
            operator: Operator::Eq,
            operands: vec![json!("red")],
        },
        "Invalid attribute color: not defined in the entity schema"
    )]
    #[case::wrong_arity(
        FilterExpression::Condition {
            attribute: "rent".to_string(),
            operator: Operator::Between,
            operands: vec![json!("1")],
        },
        "Invalid attribute rent: Between takes 2 operands, received 1"
    )]
    fn test_compile_invalid(
        mall_stores: Entity,
        #[case] expression: FilterExpression,
        #[case] expected: &str,
    ) {
        let error = ClauseState::default()
            .apply(&expression, mall_stores.filter_attributes())
            .unwrap_err();
        assert_eq!(error.to_string(), expected);
    }
}
