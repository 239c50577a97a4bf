//! Idempotent schema bootstrap. Enum types are guarded with `pg_type`
//! existence checks, tables with `IF NOT EXISTS`; safe to run on every
//! startup.
//!
//! Organizations, employees and their responsibility links are
//! pre-provisioned data: the service only ever reads them.

use anyhow::anyhow;
use sqlx::PgPool;

use tender_core::ports::Result;

const STATEMENTS: &[&str] = &[
    r#"
    DO $$
    BEGIN
        IF NOT EXISTS (SELECT 1 FROM pg_type WHERE typname = 'organization_type') THEN
            CREATE TYPE organization_type AS ENUM ('IE', 'LLC', 'JSC');
        END IF;
    END $$;
    "#,
    r#"
    DO $$
    BEGIN
        IF NOT EXISTS (SELECT 1 FROM pg_type WHERE typname = 'service_type') THEN
            CREATE TYPE service_type AS ENUM ('Construction', 'Delivery', 'Manufacture');
        END IF;
    END $$;
    "#,
    r#"
    DO $$
    BEGIN
        IF NOT EXISTS (SELECT 1 FROM pg_type WHERE typname = 'tender_status') THEN
            CREATE TYPE tender_status AS ENUM ('Created', 'Published', 'Closed');
        END IF;
    END $$;
    "#,
    r#"
    DO $$
    BEGIN
        IF NOT EXISTS (SELECT 1 FROM pg_type WHERE typname = 'bid_status') THEN
            CREATE TYPE bid_status AS ENUM ('Created', 'Published', 'Canceled');
        END IF;
    END $$;
    "#,
    r#"
    DO $$
    BEGIN
        IF NOT EXISTS (SELECT 1 FROM pg_type WHERE typname = 'bid_decision') THEN
            CREATE TYPE bid_decision AS ENUM ('Approved', 'Rejected');
        END IF;
    END $$;
    "#,
    r#"
    DO $$
    BEGIN
        IF NOT EXISTS (SELECT 1 FROM pg_type WHERE typname = 'author_type') THEN
            CREATE TYPE author_type AS ENUM ('Organization', 'User');
        END IF;
    END $$;
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS organization (
        id          UUID PRIMARY KEY DEFAULT gen_random_uuid(),
        name        VARCHAR(100) UNIQUE NOT NULL,
        description TEXT,
        type        organization_type,
        created_at  TIMESTAMPTZ NOT NULL DEFAULT now(),
        updated_at  TIMESTAMPTZ NOT NULL DEFAULT now()
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS employee (
        id         UUID PRIMARY KEY DEFAULT gen_random_uuid(),
        username   VARCHAR(50) UNIQUE NOT NULL,
        first_name VARCHAR(50),
        last_name  VARCHAR(50),
        created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
        updated_at TIMESTAMPTZ NOT NULL DEFAULT now()
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS organization_responsible (
        id              UUID PRIMARY KEY DEFAULT gen_random_uuid(),
        organization_id UUID REFERENCES organization (id) ON DELETE CASCADE,
        user_id         UUID REFERENCES employee (id) ON DELETE CASCADE
    )
    "#,
    r#"
    CREATE UNIQUE INDEX IF NOT EXISTS uniq_organization_responsible
        ON organization_responsible (organization_id, user_id)
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS tender (
        id               UUID PRIMARY KEY DEFAULT gen_random_uuid(),
        name             VARCHAR(100) NOT NULL,
        description      VARCHAR(500) NOT NULL,
        service_type     service_type NOT NULL,
        status           tender_status NOT NULL DEFAULT 'Created',
        organization_id  UUID REFERENCES organization (id) ON DELETE CASCADE,
        creator_username VARCHAR(50) REFERENCES employee (username) ON DELETE CASCADE,
        version          INT NOT NULL DEFAULT 1,
        created_at       TIMESTAMPTZ NOT NULL DEFAULT now()
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS tender_version (
        tender_id        UUID REFERENCES tender (id) ON DELETE CASCADE,
        version          INT NOT NULL,
        name             VARCHAR(100),
        description      VARCHAR(500),
        service_type     service_type,
        status           tender_status,
        organization_id  UUID,
        creator_username VARCHAR(50),
        created_at       TIMESTAMPTZ,
        PRIMARY KEY (tender_id, version)
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS bid (
        id          UUID PRIMARY KEY DEFAULT gen_random_uuid(),
        name        VARCHAR(250) NOT NULL,
        description VARCHAR(500) NOT NULL,
        decision    bid_decision,
        status      bid_status NOT NULL DEFAULT 'Created',
        tender_id   UUID REFERENCES tender (id) ON DELETE CASCADE,
        author_type author_type NOT NULL,
        author_id   UUID NOT NULL,
        version     INT NOT NULL DEFAULT 1,
        created_at  TIMESTAMPTZ NOT NULL DEFAULT now()
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS bid_version (
        bid_id      UUID REFERENCES bid (id) ON DELETE CASCADE,
        version     INT NOT NULL,
        name        VARCHAR(250),
        description VARCHAR(500),
        decision    bid_decision,
        status      bid_status,
        tender_id   UUID,
        author_type author_type,
        author_id   UUID,
        created_at  TIMESTAMPTZ,
        PRIMARY KEY (bid_id, version)
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS bid_approval (
        bid_id      UUID REFERENCES bid (id) ON DELETE CASCADE,
        responsible UUID NOT NULL,
        PRIMARY KEY (bid_id, responsible)
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS feedback (
        id          UUID PRIMARY KEY DEFAULT gen_random_uuid(),
        bid_id      UUID REFERENCES bid (id) ON DELETE CASCADE,
        description VARCHAR(1000) NOT NULL,
        created_at  TIMESTAMPTZ NOT NULL DEFAULT now()
    )
    "#,
];

pub async fn bootstrap(pool: &PgPool) -> Result<()> {
    for statement in STATEMENTS {
        sqlx::query(statement)
            .execute(pool)
            .await
            .map_err(|e| anyhow!(e))?;
    }
    tracing::info!("database schema bootstrapped");
    Ok(())
}
