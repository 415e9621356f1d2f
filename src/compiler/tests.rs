use super::*;
use crate::compiled::ReturningPlaceholder;
use crate::dialect::DdlErrorKind;
use crate::request::{ColumnDef, ColumnType, CompareOp, Direction, JoinKind, SchemaRequest};

fn single(request: impl Into<Request>, dialect: &DialectStrategy) -> CompiledStatement {
    match compile(&request.into(), dialect).unwrap() {
        CompiledQuery::Single(stmt) => stmt,
        CompiledQuery::Sequence(stmts) => panic!("expected one statement, got {}", stmts.len()),
    }
}

fn values(stmt: &CompiledStatement) -> Vec<RowValues> {
    stmt.values().into_iter().cloned().collect()
}

#[test]
fn insert_positions_oracle_placeholders_in_order() {
    let oracle = DialectStrategy::oracle();
    let stmt = single(
        QueryRequest::insert_one(
            "users",
            vec![
                ("name", RowValues::from("alice")),
                ("email", RowValues::from("a@example.com")),
                ("age", RowValues::Int(30)),
            ],
        ),
        &oracle,
    );
    assert_eq!(
        stmt.sql,
        r#"insert into "users" ("age", "email", "name") values (:1, :2, :3)"#
    );
    assert_eq!(
        values(&stmt),
        vec![
            RowValues::Int(30),
            RowValues::Text("a@example.com".into()),
            RowValues::Text("alice".into()),
        ]
    );
}

#[test]
fn rownum_limit_wraps_inner_select() {
    let oracle = DialectStrategy::oracle();
    let stmt = single(
        QueryRequest::select("users")
            .columns(["id"])
            .where_eq("name", "bob")
            .limit(3),
        &oracle,
    );
    assert_eq!(
        stmt.sql,
        r#"select * from (select "id" from "users" where "name" = :1) where rownum <= :2"#
    );
    assert_eq!(stmt.values().last(), Some(&&RowValues::Int(3)));
}

#[test]
fn rownum_offset_uses_two_wraps() {
    let oracle = DialectStrategy::oracle();
    let stmt = single(QueryRequest::select("users").limit(10).offset(5), &oracle);
    assert_eq!(
        stmt.sql,
        r#"select * from (select row_.*, ROWNUM rownum_ from (select * from "users") row_ where rownum <= :1) where rownum_ > :2"#
    );
    assert_eq!(values(&stmt), vec![RowValues::Int(15), RowValues::Int(5)]);

    let offset_only = single(QueryRequest::select("users").offset(5), &oracle);
    assert_eq!(
        values(&offset_only),
        vec![RowValues::Int(10_000_000_000_005), RowValues::Int(5)]
    );
}

#[test]
fn native_paging_per_dialect() {
    let sqlite = single(
        QueryRequest::select("users").offset(5),
        &DialectStrategy::sqlite(),
    );
    assert_eq!(sqlite.sql, r#"select * from "users" limit ? offset ?"#);
    assert_eq!(values(&sqlite), vec![RowValues::Int(-1), RowValues::Int(5)]);

    let pg = single(
        QueryRequest::select("users").offset(5),
        &DialectStrategy::postgres(),
    );
    assert_eq!(pg.sql, r#"select * from "users" offset $1"#);

    let mssql = single(
        QueryRequest::select("users").limit(10).offset(5),
        &DialectStrategy::mssql(),
    );
    assert_eq!(
        mssql.sql,
        "select * from [users] order by (select 0) offset @p1 rows fetch next @p2 rows only"
    );
    assert_eq!(values(&mssql), vec![RowValues::Int(5), RowValues::Int(10)]);

    let ordered = single(
        QueryRequest::select("users")
            .order_by("id", Direction::Desc)
            .limit(1),
        &DialectStrategy::mssql(),
    );
    assert_eq!(
        ordered.sql,
        "select * from [users] order by [id] desc offset @p1 rows fetch next @p2 rows only"
    );
}

#[test]
fn first_implies_limit_one() {
    let stmt = single(
        QueryRequest::first("users").where_eq("id", 7),
        &DialectStrategy::sqlite(),
    );
    assert_eq!(stmt.sql, r#"select * from "users" where "id" = ? limit ?"#);
    assert_eq!(values(&stmt), vec![RowValues::Int(7), RowValues::Int(1)]);
    assert_eq!(stmt.method, Method::First);
}

#[test]
fn pluck_selects_the_named_column() {
    let stmt = single(QueryRequest::pluck("users", "name"), &DialectStrategy::postgres());
    assert_eq!(stmt.sql, r#"select "name" from "users""#);
    assert_eq!(stmt.pluck.as_deref(), Some("name"));
}

#[test]
fn subquery_bindings_keep_their_order() {
    let pg = DialectStrategy::postgres();
    let stmt = single(
        QueryRequest::select("accounts")
            .where_eq("active", true)
            .where_in_subquery(
                "id",
                QueryRequest::select("logins")
                    .columns(["account_id"])
                    .where_eq("ip", "10.0.0.1"),
            )
            .where_eq("region", "eu"),
        &pg,
    );
    assert_eq!(
        stmt.sql,
        r#"select * from "accounts" where "active" = $1 and "id" in (select "account_id" from "logins" where "ip" = $2) and "region" = $3"#
    );
    assert_eq!(
        values(&stmt),
        vec![
            RowValues::Bool(true),
            RowValues::Text("10.0.0.1".into()),
            RowValues::Text("eu".into()),
        ]
    );
}

#[test]
fn subquery_limit_is_emulated_too() {
    let oracle = DialectStrategy::oracle();
    let stmt = single(
        QueryRequest::select("accounts").where_in_subquery(
            "id",
            QueryRequest::select("logins").columns(["account_id"]).limit(2),
        ),
        &oracle,
    );
    assert_eq!(
        stmt.sql,
        r#"select * from "accounts" where "id" in (select * from (select "account_id" from "logins") where rownum <= :1)"#
    );
}

#[test]
fn predicate_tree_renders_grouped() {
    let stmt = single(
        QueryRequest::select("users")
            .filter(Predicate::Or(vec![
                Predicate::eq("a", 1),
                Predicate::compare("b", CompareOp::Gt, 2),
            ]))
            .where_in("c", vec![])
            .filter(Predicate::Not(Box::new(Predicate::IsNull("d".into())))),
        &DialectStrategy::postgres(),
    );
    assert_eq!(
        stmt.sql,
        r#"select * from "users" where ("a" = $1 or "b" > $2) and 1 = 0 and not ("d" is null)"#
    );
}

#[test]
fn joins_quote_dotted_columns() {
    let stmt = single(
        QueryRequest::select("users")
            .columns(["users.name", "orders.total"])
            .join(JoinKind::Inner, "orders", "users.id", "orders.user_id"),
        &DialectStrategy::postgres(),
    );
    assert_eq!(
        stmt.sql,
        r#"select "users"."name", "orders"."total" from "users" inner join "orders" on "users"."id" = "orders"."user_id""#
    );
}

#[test]
fn aliases_follow_dialect_style() {
    let req = QueryRequest::select("users").columns(["name AS n", "id"]);
    assert_eq!(
        single(req.clone(), &DialectStrategy::oracle()).sql,
        r#"select "name" "n", "id" from "users""#
    );
    assert_eq!(
        single(req, &DialectStrategy::postgres()).sql,
        r#"select "name" as "n", "id" from "users""#
    );
}

#[test]
fn schema_qualified_table_wraps_each_segment() {
    let stmt = single(QueryRequest::select("public.users"), &DialectStrategy::postgres());
    assert_eq!(stmt.sql, r#"select * from "public"."users""#);
}

#[test]
fn disabled_quoting_leaves_raw_literals_alone() {
    let stmt = single(
        QueryRequest::select("users")
            .quote(false)
            .where_raw(
                r#"id = ? or "email" = ?"#,
                vec![RowValues::Int(1), RowValues::from("a@example.com")],
            ),
        &DialectStrategy::postgres(),
    );
    assert_eq!(stmt.sql, r#"select * from users where id = $1 or "email" = $2"#);

    let pg = DialectStrategy::postgres();
    let compiler = QueryCompiler::new(&pg, false);
    let stmt = compiler
        .compile_query(&QueryRequest::select("Users").where_eq("Name", "x"))
        .unwrap();
    assert_eq!(stmt.sql, "select * from Users where Name = $1");
}

#[test]
fn question_mark_inside_raw_literal_still_takes_a_position() {
    let stmt = single(
        QueryRequest::select("t").where_raw("note = 'why?' and id = ?", vec![RowValues::Int(1)]),
        &DialectStrategy::oracle(),
    );
    assert_eq!(stmt.sql, r#"select * from "t" where note = 'why:1' and id = :2"#);
}

#[test]
fn oracle_returning_uses_rowid_out_param_and_refetch() {
    let oracle = DialectStrategy::oracle();
    let stmt = single(
        QueryRequest::insert_one("users", vec![("name", RowValues::from("alice"))])
            .returning(["id"]),
        &oracle,
    );
    assert_eq!(
        stmt.sql,
        r#"insert into "users" ("name") values (:1) returning ROWID into :2"#
    );
    assert_eq!(
        stmt.returning_placeholders(),
        vec![&ReturningPlaceholder {
            column: "id".into(),
            ordinal: 0,
        }]
    );
    let secondary = stmt.secondary.expect("refetch statement");
    assert_eq!(
        secondary.sql,
        r#"select "id" from "users" where ROWID in (:1)"#
    );
    assert_eq!(secondary.row_id_params, vec!["returnParam".to_string()]);
    assert_eq!(stmt.returning, Some(vec!["id".to_string()]));
}

#[test]
fn oracle_update_returning_joins_columns() {
    let stmt = single(
        QueryRequest::update("users", vec![("name", RowValues::from("b"))])
            .where_eq("id", 1)
            .returning(["id", "name"]),
        &DialectStrategy::oracle(),
    );
    assert_eq!(
        stmt.sql,
        r#"update "users" set "name" = :1 where "id" = :2 returning ROWID into :3"#
    );
    assert_eq!(stmt.returning_placeholders()[0].column, "id:name");
    assert_eq!(
        stmt.secondary.unwrap().sql,
        r#"select "id", "name" from "users" where ROWID in (:1)"#
    );
}

#[test]
fn native_and_output_returning() {
    let req = QueryRequest::insert_one("users", vec![("name", RowValues::from("alice"))])
        .returning(["id"]);

    let pg = single(req.clone(), &DialectStrategy::postgres());
    assert_eq!(
        pg.sql,
        r#"insert into "users" ("name") values ($1) returning "id""#
    );
    assert!(pg.secondary.is_none());

    let mssql = single(req, &DialectStrategy::mssql());
    assert_eq!(
        mssql.sql,
        "insert into [users] ([name]) output inserted.[id] values (@p1)"
    );

    let delete = single(
        QueryRequest::delete("users").where_eq("id", 1).returning(["id"]),
        &DialectStrategy::mssql(),
    );
    assert_eq!(
        delete.sql,
        "delete from [users] output deleted.[id] where [id] = @p1"
    );

    let star = single(
        QueryRequest::delete("users").returning(["*"]),
        &DialectStrategy::sqlite(),
    );
    assert_eq!(star.sql, r#"delete from "users" returning *"#);
}

#[test]
fn counter_increments_and_decrements() {
    let pg = DialectStrategy::postgres();
    let inc = single(
        QueryRequest::increment("users", "logins", 2).where_eq("id", 1),
        &pg,
    );
    assert_eq!(
        inc.sql,
        r#"update "users" set "logins" = "logins" + $1 where "id" = $2"#
    );
    let dec = single(QueryRequest::decrement("users", "logins", 3), &pg);
    assert_eq!(dec.sql, r#"update "users" set "logins" = "logins" - $1"#);
    assert_eq!(values(&dec), vec![RowValues::Int(3)]);
}

#[test]
fn multi_row_insert_fills_missing_cells_with_null() {
    let rows = vec![
        vec![("name", RowValues::from("a"))],
        vec![("name", RowValues::from("b")), ("age", RowValues::Int(2))],
    ];
    let pg = single(QueryRequest::insert("users", rows.clone()), &DialectStrategy::postgres());
    assert_eq!(
        pg.sql,
        r#"insert into "users" ("age", "name") values ($1, $2), ($3, $4)"#
    );

    let oracle = single(QueryRequest::insert("users", rows), &DialectStrategy::oracle());
    assert_eq!(
        oracle.sql,
        r#"insert all into "users" ("age", "name") values (:1, :2) into "users" ("age", "name") values (:3, :4) select 1 from dual"#
    );
    assert_eq!(
        values(&oracle),
        vec![
            RowValues::Null,
            RowValues::Text("a".into()),
            RowValues::Int(2),
            RowValues::Text("b".into()),
        ]
    );
}

#[test]
fn unbuildable_requests_fail_before_io() {
    let pg = DialectStrategy::postgres();
    let empty_insert = QueryRequest::insert::<&str>("users", vec![]);
    assert!(matches!(
        compile(&empty_insert.into(), &pg),
        Err(SqlMiddlewareDbError::CompilationError(_))
    ));

    let empty_update = QueryRequest::update::<&str>("users", vec![]);
    assert!(matches!(
        compile(&empty_update.into(), &pg),
        Err(SqlMiddlewareDbError::CompilationError(_))
    ));

    let no_table = QueryRequest::select("  ");
    assert!(matches!(
        compile(&no_table.into(), &pg),
        Err(SqlMiddlewareDbError::CompilationError(_))
    ));
}

#[test]
fn oracle_multi_row_returning_binds_one_rowid_per_row() {
    let stmt = single(
        QueryRequest::insert(
            "users",
            vec![
                vec![("name", RowValues::from("a"))],
                vec![("name", RowValues::from("b"))],
            ],
        )
        .returning(["id"]),
        &DialectStrategy::oracle(),
    );
    assert_eq!(
        stmt.sql,
        r#"begin insert into "users" ("name") values (:1) returning ROWID into :2; insert into "users" ("name") values (:3) returning ROWID into :4; end;"#
    );
    assert_eq!(
        stmt.returning_placeholders(),
        vec![
            &ReturningPlaceholder {
                column: "id".into(),
                ordinal: 0,
            },
            &ReturningPlaceholder {
                column: "id".into(),
                ordinal: 1,
            },
        ]
    );
    assert_eq!(values(&stmt), vec![RowValues::from("a"), RowValues::from("b")]);

    let secondary = stmt.secondary.expect("refetch statement");
    assert_eq!(
        secondary.sql,
        r#"select "id" from "users" where ROWID in (:1, :2)"#
    );
    assert_eq!(
        secondary.row_id_params,
        vec!["returnParam".to_string(), "returnParam1".to_string()]
    );
}

#[test]
fn oracle_rejects_delete_returning() {
    let delete = QueryRequest::delete("users").returning(["id"]);
    assert!(matches!(
        compile(&delete.into(), &DialectStrategy::oracle()),
        Err(SqlMiddlewareDbError::CompilationError(_))
    ));
}

#[test]
fn counter_amount_overflow_is_rejected() {
    for req in [
        QueryRequest::increment("accounts", "balance", i64::MIN),
        QueryRequest::decrement("accounts", "balance", i64::MIN),
    ] {
        assert!(matches!(
            compile(&req.into(), &DialectStrategy::postgres()),
            Err(SqlMiddlewareDbError::CompilationError(_))
        ));
    }

    let stmt = single(
        QueryRequest::decrement("accounts", "balance", i64::MAX),
        &DialectStrategy::postgres(),
    );
    assert_eq!(values(&stmt), vec![RowValues::Int(i64::MAX)]);
}

fn users_table() -> SchemaRequest {
    SchemaRequest::create_table(
        "users",
        vec![
            ColumnDef::new("id", ColumnType::Increments),
            ColumnDef::new("name", ColumnType::String(255)).not_nullable(),
            ColumnDef::new("bio", ColumnType::Text).nullable(),
        ],
    )
}

#[test]
fn oracle_create_table_emits_table_sequence_trigger() {
    let compiled = compile(&users_table().into(), &DialectStrategy::oracle()).unwrap();
    assert_eq!(
        compiled.sql(),
        vec![
            r#"create table "users" ("id" integer not null primary key, "name" varchar2(255) not null, "bio" clob null)"#,
            r#"create sequence "users_seq""#,
            r#"create or replace trigger "users_id_trg" before insert on "users" for each row when (new."id" is null) begin select "users_seq".nextval into :new."id" from dual; end;"#,
        ]
    );
    let tolerated: Vec<_> = compiled.statements().iter().map(|s| s.tolerates).collect();
    assert_eq!(tolerated, vec![None, Some(DdlErrorKind::AlreadyExists), None]);
    assert!(compiled.statements().iter().all(|s| s.method == Method::Schema));
}

#[test]
fn oracle_drop_table_mirrors_create() {
    let oracle = DialectStrategy::oracle();
    let compiled = compile(
        &SchemaRequest::drop_table_if_exists("users").into(),
        &oracle,
    )
    .unwrap();
    assert_eq!(
        compiled.sql(),
        vec![r#"drop table "users""#, r#"drop sequence "users_seq""#]
    );
    let tolerated: Vec<_> = compiled.statements().iter().map(|s| s.tolerates).collect();
    assert_eq!(
        tolerated,
        vec![Some(DdlErrorKind::AlreadyAbsent), Some(DdlErrorKind::AlreadyAbsent)]
    );

    let strict = compile(&SchemaRequest::drop_table("users").into(), &oracle).unwrap();
    assert_eq!(strict.statements()[0].tolerates, None);
}

#[test]
fn identity_dialects_create_one_statement() {
    let pg = compile(&users_table().into(), &DialectStrategy::postgres()).unwrap();
    assert_eq!(
        pg.sql(),
        vec![
            r#"create table "users" ("id" serial primary key, "name" varchar(255) not null, "bio" text null)"#
        ]
    );

    let sqlite = compile(&users_table().into(), &DialectStrategy::sqlite()).unwrap();
    assert_eq!(
        sqlite.sql(),
        vec![
            r#"create table "users" ("id" integer not null primary key autoincrement, "name" varchar(255) not null, "bio" text null)"#
        ]
    );

    let drop = compile(
        &SchemaRequest::drop_table_if_exists("users").into(),
        &DialectStrategy::postgres(),
    )
    .unwrap();
    assert_eq!(drop.sql(), vec![r#"drop table if exists "users""#]);
}

#[test]
fn schema_without_columns_is_rejected() {
    let req = SchemaRequest::create_table("users", vec![]);
    assert!(matches!(
        compile(&req.into(), &DialectStrategy::sqlite()),
        Err(SqlMiddlewareDbError::CompilationError(_))
    ));
}
