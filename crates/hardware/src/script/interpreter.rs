//! Tree-walking interpreter.
//!
//! [`Interpreter`] is the default [`ScriptEngine`]. Each invocation (the
//! top-level program or one timer callback) runs on a short-lived `Machine`
//! that borrows the host and the timer scheduler, and charges every statement,
//! loop iteration and call against the invocation's budget:
//! 1. **Steps:** a counter compared with `max_steps` on every charge.
//! 2. **Wall clock:** a deadline checked every 256 steps, only when a timeout is set.
//! 3. **Call depth:** nested script calls beyond `max_call_depth` unwind with a `RangeError`.

use std::cmp::Ordering;
use std::collections::HashMap;
use std::rc::Rc;
use std::time::{Duration, Instant};

use tracing::{debug, trace};

use crate::common::error::{Budget, ScriptError};
use crate::config::ExecutionConfig;
use crate::script::ast::{
    BinaryOp, DeclKind, Expr, FunctionBody, LogicalOp, Program, Stmt, UnaryOp,
};
use crate::script::builtins::{self, MAX_ARRAY_LENGTH, MAX_STRING_LENGTH};
use crate::script::parser;
use crate::script::scope::{Env, Scope};
use crate::script::value::{Closure, Native, Object, Runtime, Value};
use crate::script::{Host, ScriptEngine};

/// Steps between wall-clock deadline checks.
const DEADLINE_CHECK_INTERVAL: u64 = 256;

/// Most timers a script may have pending at once.
const MAX_TIMERS: usize = 10_000;

/// Per-invocation execution limits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Limits {
    /// Wall-clock budget per invocation.
    pub timeout: Option<Duration>,
    /// Step budget per invocation.
    pub max_steps: Option<u64>,
    /// Maximum nested script calls.
    pub max_call_depth: usize,
    /// Maximum firings of one periodic callback per `advance`.
    pub max_catch_up: u32,
}

impl From<&ExecutionConfig> for Limits {
    fn from(config: &ExecutionConfig) -> Self {
        Self {
            timeout: config.timeout(),
            max_steps: config.max_steps,
            max_call_depth: config.max_call_depth,
            max_catch_up: config.max_catch_up,
        }
    }
}

impl Default for Limits {
    fn default() -> Self {
        Self::from(&ExecutionConfig::default())
    }
}

#[derive(Debug)]
struct Timer {
    id: u32,
    callback: Value,
    period_ms: u64,
    next_due: u64,
    repeat: bool,
    /// Scheduler round the timer was created in.
    round: u64,
}

/// Pending `setInterval`/`setTimeout` callbacks on a virtual millisecond clock.
#[derive(Debug, Default)]
struct Scheduler {
    timers: Vec<Timer>,
    next_id: u32,
    now_ms: u64,
    /// Incremented by every `advance`; timers created during a round wait for the next one.
    round: u64,
}

impl Scheduler {
    fn schedule(&mut self, callback: Value, delay_ms: u64, repeat: bool) -> Result<u32, ScriptError> {
        if self.timers.len() >= MAX_TIMERS {
            return Err(ScriptError::Range("Too many pending timers".to_string()));
        }
        self.next_id = self.next_id.wrapping_add(1).max(1);
        let period_ms = if repeat { delay_ms.max(1) } else { delay_ms };
        self.timers.push(Timer {
            id: self.next_id,
            callback,
            period_ms,
            next_due: self.now_ms.saturating_add(period_ms),
            repeat,
            round: self.round,
        });
        Ok(self.next_id)
    }

    fn cancel(&mut self, id: u32) {
        self.timers.retain(|timer| timer.id != id);
    }

    /// Index of the earliest timer due at or before `now` (ties go to the older timer).
    ///
    /// Only timers created before the current round are eligible.
    fn next_due(&self, now: u64) -> Option<usize> {
        self.timers
            .iter()
            .enumerate()
            .filter(|(_, timer)| timer.round < self.round && timer.next_due <= now)
            .min_by_key(|(_, timer)| (timer.next_due, timer.id))
            .map(|(index, _)| index)
    }
}

/// The default script engine.
#[derive(Debug)]
pub struct Interpreter {
    limits: Limits,
    globals: Option<Env>,
    scheduler: Scheduler,
    steps: u64,
}

impl Interpreter {
    /// Creates an interpreter with the given limits.
    pub fn new(limits: Limits) -> Self {
        Self {
            limits,
            globals: None,
            scheduler: Scheduler::default(),
            steps: 0,
        }
    }

    /// Returns the active limits.
    pub const fn limits(&self) -> &Limits {
        &self.limits
    }

    /// Reads a global binding left by the last program, if any.
    pub fn global(&self, name: &str) -> Option<Value> {
        self.globals.as_ref().and_then(|globals| globals.lookup(name))
    }

    /// Cancels callbacks and releases the previous program's globals.
    fn teardown(&mut self) {
        self.scheduler.timers.clear();
        if let Some(globals) = self.globals.take() {
            globals.clear();
        }
    }
}

impl Default for Interpreter {
    fn default() -> Self {
        Self::new(Limits::default())
    }
}

impl Drop for Interpreter {
    fn drop(&mut self) {
        self.teardown();
    }
}

impl ScriptEngine for Interpreter {
    fn run(&mut self, source: &str, host: &mut dyn Host) -> Result<(), ScriptError> {
        self.teardown();
        self.steps = 0;
        let program = parser::parse(source)?;

        let globals = Scope::global();
        builtins::install(&globals, host.capabilities());
        self.globals = Some(Rc::clone(&globals));

        let mut machine = Machine::new(host, &self.limits, &mut self.scheduler, &globals);
        let result = machine.exec_program(&program);
        self.steps = machine.steps;
        debug!(
            steps = self.steps,
            timers = self.scheduler.timers.len(),
            "program finished"
        );
        result
    }

    fn advance(&mut self, elapsed_ms: u64, host: &mut dyn Host) -> Result<usize, ScriptError> {
        let Some(globals) = self.globals.clone() else {
            return Ok(0);
        };
        let now = self.scheduler.now_ms.saturating_add(elapsed_ms);
        self.scheduler.now_ms = now;
        self.scheduler.round += 1;

        let mut fired = 0;
        let mut firings: HashMap<u32, u32> = HashMap::new();
        while let Some(index) = self.scheduler.next_due(now) {
            let timer = &mut self.scheduler.timers[index];
            let id = timer.id;
            let callback = timer.callback.clone();
            if timer.repeat {
                let count = firings.entry(id).or_insert(0);
                *count += 1;
                if *count > self.limits.max_catch_up {
                    timer.next_due = now.saturating_add(timer.period_ms);
                    debug!(id, "periodic callback fell behind, skipping missed periods");
                    continue;
                }
                timer.next_due = timer.next_due.saturating_add(timer.period_ms);
            } else {
                let _ = self.scheduler.timers.remove(index);
            }

            trace!(id, now_ms = now, "firing timer");
            let mut machine =
                Machine::new(&mut *host, &self.limits, &mut self.scheduler, &globals);
            let result = machine.call_value(&callback, &[], None);
            self.steps = self.steps.saturating_add(machine.steps);
            let _ = result.map_err(Unwind::into_error)?;
            fired += 1;
        }
        Ok(fired)
    }

    fn pending_callbacks(&self) -> usize {
        self.scheduler.timers.len()
    }

    fn cancel_callbacks(&mut self) {
        if !self.scheduler.timers.is_empty() {
            debug!(count = self.scheduler.timers.len(), "cancelling timers");
        }
        self.scheduler.timers.clear();
    }

    fn steps(&self) -> u64 {
        self.steps
    }
}

/// Non-local exits while evaluating.
enum Unwind {
    Error(ScriptError),
    Throw(Value),
}

impl Unwind {
    fn into_error(self) -> ScriptError {
        match self {
            Self::Error(err) => err,
            Self::Throw(value) => ScriptError::Thrown(value.thrown_message()),
        }
    }
}

impl From<ScriptError> for Unwind {
    fn from(err: ScriptError) -> Self {
        Self::Error(err)
    }
}

type Flow<T> = Result<T, Unwind>;

enum Completion {
    Normal,
    Return(Value),
    Break,
    Continue,
}

/// Assignment target with its object and key already evaluated.
enum Place {
    Var(String),
    Prop(Value, String),
    Elem(Value, Value),
}

/// State of one invocation.
struct Machine<'a> {
    host: &'a mut dyn Host,
    limits: &'a Limits,
    scheduler: &'a mut Scheduler,
    globals: &'a Env,
    steps: u64,
    depth: usize,
    deadline: Option<Instant>,
}

impl<'a> Machine<'a> {
    fn new(
        host: &'a mut dyn Host,
        limits: &'a Limits,
        scheduler: &'a mut Scheduler,
        globals: &'a Env,
    ) -> Self {
        // Instant is only touched when a wall-clock budget is configured.
        let deadline = limits.timeout.map(|timeout| Instant::now() + timeout);
        Self {
            host,
            limits,
            scheduler,
            globals,
            steps: 0,
            depth: 0,
            deadline,
        }
    }

    fn exec_program(&mut self, program: &Program) -> Result<(), ScriptError> {
        let globals = Rc::clone(self.globals);
        self.exec_block(&program.body, &globals)
            .map(|_| ())
            .map_err(Unwind::into_error)
    }

    /// Charges one step against the budget.
    fn charge(&mut self) -> Flow<()> {
        self.steps += 1;
        if let Some(max) = self.limits.max_steps {
            if self.steps > max {
                return Err(ScriptError::Timeout(Budget::Steps(max)).into());
            }
        }
        if self.steps % DEADLINE_CHECK_INTERVAL == 0 {
            if let (Some(deadline), Some(timeout)) = (self.deadline, self.limits.timeout) {
                if Instant::now() >= deadline {
                    let millis = u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX);
                    return Err(ScriptError::Timeout(Budget::WallClock(millis)).into());
                }
            }
        }
        Ok(())
    }

    // ===== Statements =====

    /// Binds the block's function declarations before any of its statements run.
    fn hoist(stmts: &[Stmt], env: &Env) {
        for stmt in stmts {
            if let Stmt::Function(def) = stmt {
                if let Some(name) = &def.name {
                    let closure = Closure {
                        def: Rc::clone(def),
                        env: Rc::clone(env),
                    };
                    env.declare(name, Value::Function(Rc::new(closure)), true);
                }
            }
        }
    }

    fn exec_block(&mut self, stmts: &[Stmt], env: &Env) -> Flow<Completion> {
        Self::hoist(stmts, env);
        for stmt in stmts {
            match self.exec(stmt, env)? {
                Completion::Normal => {}
                other => return Ok(other),
            }
        }
        Ok(Completion::Normal)
    }

    fn exec_scoped(&mut self, stmts: &[Stmt], env: &Env) -> Flow<Completion> {
        let scope = Scope::child(env);
        self.exec_block(stmts, &scope)
    }

    fn exec(&mut self, stmt: &Stmt, env: &Env) -> Flow<Completion> {
        self.charge()?;
        match stmt {
            Stmt::Declare { kind, bindings } => {
                self.exec_declare(*kind, bindings, env)?;
                Ok(Completion::Normal)
            }
            Stmt::Function(_) | Stmt::Empty => Ok(Completion::Normal),
            Stmt::Expr(expr) => {
                let _ = self.eval(expr, env)?;
                Ok(Completion::Normal)
            }
            Stmt::If {
                cond,
                then,
                otherwise,
            } => {
                if self.eval(cond, env)?.truthy() {
                    self.exec(then, env)
                } else if let Some(otherwise) = otherwise {
                    self.exec(otherwise, env)
                } else {
                    Ok(Completion::Normal)
                }
            }
            Stmt::While { cond, body } => self.exec_while(cond, body, env),
            Stmt::DoWhile { body, cond } => self.exec_do_while(body, cond, env),
            Stmt::For {
                init,
                cond,
                update,
                body,
            } => self.exec_for(init.as_deref(), cond.as_ref(), update.as_ref(), body, env),
            Stmt::Block(stmts) => self.exec_scoped(stmts, env),
            Stmt::Return(value) => {
                let value = match value {
                    Some(expr) => self.eval(expr, env)?,
                    None => Value::Undefined,
                };
                Ok(Completion::Return(value))
            }
            Stmt::Break => Ok(Completion::Break),
            Stmt::Continue => Ok(Completion::Continue),
            Stmt::Throw(expr) => Err(Unwind::Throw(self.eval(expr, env)?)),
            Stmt::Try {
                block,
                param,
                handler,
                finalizer,
            } => self.exec_try(
                block,
                param.as_deref(),
                handler.as_deref(),
                finalizer.as_deref(),
                env,
            ),
        }
    }

    fn exec_declare(
        &mut self,
        kind: DeclKind,
        bindings: &[(String, Option<Expr>)],
        env: &Env,
    ) -> Flow<()> {
        for (name, init) in bindings {
            let value = match init {
                Some(expr) => self.eval(expr, env)?,
                // `var x;` keeps an existing value.
                None if kind == DeclKind::Var && env.has_own(name) => continue,
                None => Value::Undefined,
            };
            env.declare(name, value, kind != DeclKind::Const);
        }
        Ok(())
    }

    fn exec_while(&mut self, cond: &Expr, body: &Stmt, env: &Env) -> Flow<Completion> {
        while self.eval(cond, env)?.truthy() {
            match self.exec(body, env)? {
                Completion::Break => break,
                Completion::Return(value) => return Ok(Completion::Return(value)),
                Completion::Normal | Completion::Continue => {}
            }
        }
        Ok(Completion::Normal)
    }

    fn exec_do_while(&mut self, body: &Stmt, cond: &Expr, env: &Env) -> Flow<Completion> {
        loop {
            match self.exec(body, env)? {
                Completion::Break => break,
                Completion::Return(value) => return Ok(Completion::Return(value)),
                Completion::Normal | Completion::Continue => {}
            }
            if !self.eval(cond, env)?.truthy() {
                break;
            }
        }
        Ok(Completion::Normal)
    }

    fn exec_for(
        &mut self,
        init: Option<&Stmt>,
        cond: Option<&Expr>,
        update: Option<&Expr>,
        body: &Stmt,
        env: &Env,
    ) -> Flow<Completion> {
        let mut loop_env = Scope::child(env);
        let per_iteration = matches!(
            init,
            Some(Stmt::Declare {
                kind: DeclKind::Let | DeclKind::Const,
                ..
            })
        );
        if let Some(init) = init {
            let _ = self.exec(init, &loop_env)?;
        }

        loop {
            if let Some(cond) = cond {
                if !self.eval(cond, &loop_env)?.truthy() {
                    break;
                }
            }
            match self.exec(body, &loop_env)? {
                Completion::Break => break,
                Completion::Return(value) => return Ok(Completion::Return(value)),
                Completion::Normal | Completion::Continue => {}
            }
            if per_iteration {
                loop_env = loop_env.fork();
            }
            if let Some(update) = update {
                let _ = self.eval(update, &loop_env)?;
            }
        }
        Ok(Completion::Normal)
    }

    fn exec_try(
        &mut self,
        block: &[Stmt],
        param: Option<&str>,
        handler: Option<&[Stmt]>,
        finalizer: Option<&[Stmt]>,
        env: &Env,
    ) -> Flow<Completion> {
        let mut result = self.exec_scoped(block, env);

        if let Some(handler) = handler {
            let caught = match &result {
                Err(Unwind::Throw(value)) => Some(value.clone()),
                Err(Unwind::Error(err)) if err.is_catchable() => Some(Value::str(err.to_string())),
                _ => None,
            };
            if let Some(value) = caught {
                let scope = Scope::child(env);
                if let Some(param) = param {
                    scope.declare(param, value, true);
                }
                result = self.exec_block(handler, &scope);
            }
        }

        if let Some(finalizer) = finalizer {
            if let Err(Unwind::Error(err)) = &result {
                if !err.is_catchable() {
                    return result;
                }
            }
            match self.exec_scoped(finalizer, env)? {
                Completion::Normal => {}
                other => return Ok(other),
            }
        }
        result
    }

    // ===== Expressions =====

    fn eval(&mut self, expr: &Expr, env: &Env) -> Flow<Value> {
        match expr {
            Expr::Number(n) => Ok(Value::Number(*n)),
            Expr::Str(s) => Ok(Value::Str(Rc::clone(s))),
            Expr::Bool(b) => Ok(Value::Bool(*b)),
            Expr::Null => Ok(Value::Null),
            Expr::Undefined => Ok(Value::Undefined),
            Expr::Ident(name) => env
                .lookup(name)
                .ok_or_else(|| ScriptError::Reference(name.clone()).into()),
            Expr::Array(items) => self.eval_array(items, env),
            Expr::Object(props) => self.eval_object(props, env),
            Expr::Function(def) => Ok(Value::Function(Rc::new(Closure {
                def: Rc::clone(def),
                env: Rc::clone(env),
            }))),
            Expr::Unary { op, expr } => self.eval_unary(*op, expr, env),
            Expr::Update {
                increment,
                prefix,
                target,
            } => self.eval_update(*increment, *prefix, target, env),
            Expr::Binary { op, left, right } => {
                let left = self.eval(left, env)?;
                let right = self.eval(right, env)?;
                Ok(binary(*op, &left, &right)?)
            }
            Expr::Logical { op, left, right } => self.eval_logical(*op, left, right, env),
            Expr::Assign { op, target, value } => self.eval_assign(*op, target, value, env),
            Expr::Conditional {
                cond,
                then,
                otherwise,
            } => {
                if self.eval(cond, env)?.truthy() {
                    self.eval(then, env)
                } else {
                    self.eval(otherwise, env)
                }
            }
            Expr::Call { callee, args } => self.eval_call(callee, args, env),
            Expr::Member { object, property } => {
                let object = self.eval(object, env)?;
                Ok(get_property(&object, property)?)
            }
            Expr::Index { object, index } => {
                let object = self.eval(object, env)?;
                let index = self.eval(index, env)?;
                Ok(get_index(&object, &index)?)
            }
        }
    }

    fn eval_array(&mut self, items: &[Expr], env: &Env) -> Flow<Value> {
        let mut values = Vec::with_capacity(items.len());
        for item in items {
            values.push(self.eval(item, env)?);
        }
        Ok(Value::array(values))
    }

    fn eval_object(&mut self, props: &[(String, Expr)], env: &Env) -> Flow<Value> {
        let mut object = Object::new();
        for (key, expr) in props {
            let value = self.eval(expr, env)?;
            object.set(key, value);
        }
        Ok(Value::object(object))
    }

    fn eval_unary(&mut self, op: UnaryOp, expr: &Expr, env: &Env) -> Flow<Value> {
        if op == UnaryOp::Typeof {
            // `typeof undeclared` is not an error.
            if let Expr::Ident(name) = expr {
                return Ok(Value::str(
                    env.lookup(name).map_or("undefined", |value| value.type_of()),
                ));
            }
            return Ok(Value::str(self.eval(expr, env)?.type_of()));
        }
        let value = self.eval(expr, env)?;
        Ok(match op {
            UnaryOp::Not => Value::Bool(!value.truthy()),
            UnaryOp::Neg => Value::Number(-value.to_number()),
            UnaryOp::Plus => Value::Number(value.to_number()),
            UnaryOp::BitNot => Value::Number(f64::from(!value.to_int32())),
            UnaryOp::Typeof => Value::str(value.type_of()),
        })
    }

    fn eval_update(&mut self, increment: bool, prefix: bool, target: &Expr, env: &Env) -> Flow<Value> {
        let place = self.resolve(target, env)?;
        let old = self.read_place(&place, env)?.to_number();
        let new = if increment { old + 1.0 } else { old - 1.0 };
        self.write_place(&place, Value::Number(new), env)?;
        Ok(Value::Number(if prefix { new } else { old }))
    }

    fn eval_logical(&mut self, op: LogicalOp, left: &Expr, right: &Expr, env: &Env) -> Flow<Value> {
        let left = self.eval(left, env)?;
        let short_circuit = match op {
            LogicalOp::And => !left.truthy(),
            LogicalOp::Or => left.truthy(),
            LogicalOp::Nullish => !left.is_nullish(),
        };
        if short_circuit {
            Ok(left)
        } else {
            self.eval(right, env)
        }
    }

    fn eval_assign(
        &mut self,
        op: Option<BinaryOp>,
        target: &Expr,
        value: &Expr,
        env: &Env,
    ) -> Flow<Value> {
        let place = self.resolve(target, env)?;
        let value = match op {
            None => self.eval(value, env)?,
            Some(op) => {
                let current = self.read_place(&place, env)?;
                let rhs = self.eval(value, env)?;
                binary(op, &current, &rhs)?
            }
        };
        self.write_place(&place, value.clone(), env)?;
        Ok(value)
    }

    fn resolve(&mut self, target: &Expr, env: &Env) -> Flow<Place> {
        match target {
            Expr::Ident(name) => Ok(Place::Var(name.clone())),
            Expr::Member { object, property } => {
                Ok(Place::Prop(self.eval(object, env)?, property.clone()))
            }
            Expr::Index { object, index } => {
                let object = self.eval(object, env)?;
                let index = self.eval(index, env)?;
                Ok(Place::Elem(object, index))
            }
            other => Err(ScriptError::Type(format!(
                "Invalid assignment target: {}",
                other.label()
            ))
            .into()),
        }
    }

    fn read_place(&self, place: &Place, env: &Env) -> Flow<Value> {
        let value = match place {
            Place::Var(name) => env
                .lookup(name)
                .ok_or_else(|| ScriptError::Reference(name.clone()))?,
            Place::Prop(object, property) => get_property(object, property)?,
            Place::Elem(object, index) => get_index(object, index)?,
        };
        Ok(value)
    }

    fn write_place(&self, place: &Place, value: Value, env: &Env) -> Flow<()> {
        match place {
            Place::Var(name) => {
                // Assigning an undeclared name creates a global.
                if !env.assign(name, value.clone())? {
                    self.globals.declare(name, value, true);
                }
            }
            Place::Prop(object, property) => set_property(object, property, value)?,
            Place::Elem(object, index) => set_index(object, index, value)?,
        }
        Ok(())
    }

    // ===== Calls =====

    fn eval_args(&mut self, args: &[Expr], env: &Env) -> Flow<Vec<Value>> {
        let mut values = Vec::with_capacity(args.len());
        for arg in args {
            values.push(self.eval(arg, env)?);
        }
        Ok(values)
    }

    fn eval_call(&mut self, callee: &Expr, args: &[Expr], env: &Env) -> Flow<Value> {
        if let Expr::Member { object, property } = callee {
            let receiver = self.eval(object, env)?;
            return self.call_method(&receiver, property, args, env, callee);
        }
        let function = self.eval(callee, env)?;
        let args = self.eval_args(args, env)?;
        self.call_value(&function, &args, Some(callee))
    }

    fn call_method(
        &mut self,
        receiver: &Value,
        name: &str,
        args: &[Expr],
        env: &Env,
        callee: &Expr,
    ) -> Flow<Value> {
        match receiver {
            Value::Undefined | Value::Null => {
                return Err(ScriptError::Type(format!(
                    "Cannot read properties of {receiver} (reading '{name}')"
                ))
                .into());
            }
            Value::Object(object) => {
                let function = object.borrow().get(name).cloned().unwrap_or_default();
                let args = self.eval_args(args, env)?;
                return self.call_value(&function, &args, Some(callee));
            }
            Value::Array(items) if is_callback_method(name) => {
                let items = Rc::clone(items);
                let args = self.eval_args(args, env)?;
                return self.array_callback(&items, name, &args);
            }
            _ => {}
        }
        let args = self.eval_args(args, env)?;
        match builtins::call_method(receiver, name, &args) {
            Some(result) => Ok(result?),
            None => Err(not_a_function(Some(callee))),
        }
    }

    fn call_value(&mut self, function: &Value, args: &[Value], callee: Option<&Expr>) -> Flow<Value> {
        match function {
            Value::Function(closure) => self.call_closure(closure, args),
            Value::Native(Native::Host(name)) => {
                self.charge()?;
                Ok(self.host.call(name, args)?)
            }
            Value::Native(Native::Builtin(builtin)) => Ok(builtins::call(*builtin, args)?),
            Value::Native(Native::Runtime(runtime)) => self.call_runtime(*runtime, args),
            _ => Err(not_a_function(callee)),
        }
    }

    fn call_closure(&mut self, closure: &Rc<Closure>, args: &[Value]) -> Flow<Value> {
        if self.depth >= self.limits.max_call_depth {
            return Err(ScriptError::CallDepth {
                limit: self.limits.max_call_depth,
            }
            .into());
        }
        self.charge()?;

        let scope = Scope::child(&closure.env);
        for (index, param) in closure.def.params.iter().enumerate() {
            scope.declare(param, args.get(index).cloned().unwrap_or_default(), true);
        }
        if let Some(name) = &closure.def.name {
            if !scope.has_own(name) {
                scope.declare(name, Value::Function(Rc::clone(closure)), true);
            }
        }

        self.depth += 1;
        let result = match &closure.def.body {
            FunctionBody::Block(stmts) => match self.exec_block(stmts, &scope) {
                Ok(Completion::Return(value)) => Ok(value),
                Ok(_) => Ok(Value::Undefined),
                Err(unwind) => Err(unwind),
            },
            FunctionBody::Expr(expr) => self.eval(expr, &scope),
        };
        self.depth -= 1;
        result
    }

    fn call_runtime(&mut self, runtime: Runtime, args: &[Value]) -> Flow<Value> {
        match runtime {
            Runtime::SetInterval | Runtime::SetTimeout => {
                let callback = args.first().cloned().unwrap_or_default();
                if !callback.is_callable() {
                    return Err(ScriptError::Type(
                        "The \"callback\" argument must be of type function".to_string(),
                    )
                    .into());
                }
                let delay = args.get(1).map_or(0.0, Value::to_number);
                let delay_ms = if delay.is_finite() && delay > 0.0 {
                    delay as u64
                } else {
                    0
                };
                let repeat = runtime == Runtime::SetInterval;
                let id = self.scheduler.schedule(callback, delay_ms, repeat)?;
                debug!(id, delay_ms, repeat, "timer scheduled");
                Ok(Value::Number(f64::from(id)))
            }
            Runtime::ClearTimer => {
                if let Some(id) = args.first().and_then(Value::as_index) {
                    if let Ok(id) = u32::try_from(id) {
                        self.scheduler.cancel(id);
                    }
                }
                Ok(Value::Undefined)
            }
            Runtime::DateNow => Ok(Value::Number(self.host.now_millis() as f64)),
        }
    }

    fn array_callback(
        &mut self,
        items: &Rc<std::cell::RefCell<Vec<Value>>>,
        name: &str,
        args: &[Value],
    ) -> Flow<Value> {
        let callback = args.first().cloned().unwrap_or_default();
        if !callback.is_callable() {
            return Err(ScriptError::Type(format!("{callback} is not a function")).into());
        }
        // Iterate over a snapshot so the callback may mutate the array.
        let snapshot: Vec<Value> = items.borrow().clone();
        let call = |machine: &mut Self, item: &Value, index: usize| {
            machine.call_value(&callback, &[item.clone(), Value::Number(index as f64)], None)
        };

        let value = match name {
            "forEach" => {
                for (index, item) in snapshot.iter().enumerate() {
                    let _ = call(self, item, index)?;
                }
                Value::Undefined
            }
            "map" => {
                let mut out = Vec::with_capacity(snapshot.len());
                for (index, item) in snapshot.iter().enumerate() {
                    out.push(call(self, item, index)?);
                }
                Value::array(out)
            }
            "filter" => {
                let mut out = Vec::new();
                for (index, item) in snapshot.iter().enumerate() {
                    if call(self, item, index)?.truthy() {
                        out.push(item.clone());
                    }
                }
                Value::array(out)
            }
            "find" | "findIndex" => {
                let mut found = None;
                for (index, item) in snapshot.iter().enumerate() {
                    if call(self, item, index)?.truthy() {
                        found = Some((index, item.clone()));
                        break;
                    }
                }
                match (name, found) {
                    ("find", found) => found.map(|(_, item)| item).unwrap_or_default(),
                    (_, found) => Value::Number(found.map_or(-1.0, |(index, _)| index as f64)),
                }
            }
            "some" => {
                let mut any = false;
                for (index, item) in snapshot.iter().enumerate() {
                    if call(self, item, index)?.truthy() {
                        any = true;
                        break;
                    }
                }
                Value::Bool(any)
            }
            "every" => {
                let mut all = true;
                for (index, item) in snapshot.iter().enumerate() {
                    if !call(self, item, index)?.truthy() {
                        all = false;
                        break;
                    }
                }
                Value::Bool(all)
            }
            _ => {
                // reduce
                let mut iter = snapshot.iter().enumerate();
                let mut acc = match args.get(1) {
                    Some(initial) => initial.clone(),
                    None => match iter.next() {
                        Some((_, first)) => first.clone(),
                        None => {
                            return Err(ScriptError::Type(
                                "Reduce of empty array with no initial value".to_string(),
                            )
                            .into());
                        }
                    },
                };
                for (index, item) in iter {
                    acc = self.call_value(
                        &callback,
                        &[acc, item.clone(), Value::Number(index as f64)],
                        None,
                    )?;
                }
                acc
            }
        };
        Ok(value)
    }
}

fn is_callback_method(name: &str) -> bool {
    matches!(
        name,
        "forEach" | "map" | "filter" | "find" | "findIndex" | "some" | "every" | "reduce"
    )
}

fn not_a_function(callee: Option<&Expr>) -> Unwind {
    let label = callee.map_or_else(|| "callback".to_string(), Expr::label);
    ScriptError::Type(format!("{label} is not a function")).into()
}

fn is_stringy(value: &Value) -> bool {
    matches!(
        value,
        Value::Str(_) | Value::Array(_) | Value::Object(_) | Value::Function(_) | Value::Native(_)
    )
}

fn compare(left: &Value, right: &Value) -> Option<Ordering> {
    match (left, right) {
        (Value::Str(a), Value::Str(b)) => Some(a.cmp(b)),
        _ => left.to_number().partial_cmp(&right.to_number()),
    }
}

fn binary(op: BinaryOp, left: &Value, right: &Value) -> Result<Value, ScriptError> {
    let number = |f: fn(f64, f64) -> f64| Value::Number(f(left.to_number(), right.to_number()));
    let int32 = |f: fn(i32, i32) -> i32| Value::Number(f64::from(f(left.to_int32(), right.to_int32())));
    let shift = right.to_uint32() & 31;

    let value = match op {
        BinaryOp::Add if is_stringy(left) || is_stringy(right) => {
            let mut text = left.to_js_string();
            text.push_str(&right.to_js_string());
            if text.len() > MAX_STRING_LENGTH {
                return Err(ScriptError::Range("Invalid string length".to_string()));
            }
            Value::str(text)
        }
        BinaryOp::Add => number(|a, b| a + b),
        BinaryOp::Sub => number(|a, b| a - b),
        BinaryOp::Mul => number(|a, b| a * b),
        BinaryOp::Div => number(|a, b| a / b),
        BinaryOp::Rem => number(|a, b| a % b),
        BinaryOp::Pow => number(builtins::pow),
        BinaryOp::Eq => Value::Bool(left.loose_equals(right)),
        BinaryOp::Ne => Value::Bool(!left.loose_equals(right)),
        BinaryOp::StrictEq => Value::Bool(left.strict_equals(right)),
        BinaryOp::StrictNe => Value::Bool(!left.strict_equals(right)),
        BinaryOp::Lt => Value::Bool(compare(left, right) == Some(Ordering::Less)),
        BinaryOp::Le => Value::Bool(matches!(
            compare(left, right),
            Some(Ordering::Less | Ordering::Equal)
        )),
        BinaryOp::Gt => Value::Bool(compare(left, right) == Some(Ordering::Greater)),
        BinaryOp::Ge => Value::Bool(matches!(
            compare(left, right),
            Some(Ordering::Greater | Ordering::Equal)
        )),
        BinaryOp::BitAnd => int32(|a, b| a & b),
        BinaryOp::BitOr => int32(|a, b| a | b),
        BinaryOp::BitXor => int32(|a, b| a ^ b),
        BinaryOp::Shl => Value::Number(f64::from(left.to_int32().wrapping_shl(shift))),
        BinaryOp::Shr => Value::Number(f64::from(left.to_int32() >> shift)),
        BinaryOp::UShr => Value::Number(f64::from(left.to_uint32() >> shift)),
    };
    Ok(value)
}

fn get_property(object: &Value, name: &str) -> Result<Value, ScriptError> {
    let value = match object {
        Value::Undefined | Value::Null => {
            return Err(ScriptError::Type(format!(
                "Cannot read properties of {object} (reading '{name}')"
            )));
        }
        Value::Str(s) if name == "length" => Value::Number(s.chars().count() as f64),
        Value::Array(items) if name == "length" => Value::Number(items.borrow().len() as f64),
        Value::Object(fields) => fields.borrow().get(name).cloned().unwrap_or_default(),
        _ => Value::Undefined,
    };
    Ok(value)
}

fn get_index(object: &Value, index: &Value) -> Result<Value, ScriptError> {
    match (object, index) {
        (Value::Array(items), Value::Number(_)) => Ok(index
            .as_index()
            .and_then(|i| items.borrow().get(i).cloned())
            .unwrap_or_default()),
        (Value::Str(s), Value::Number(_)) => Ok(index
            .as_index()
            .and_then(|i| s.chars().nth(i))
            .map(|c| Value::str(c.to_string()))
            .unwrap_or_default()),
        _ => get_property(object, &index.to_js_string()),
    }
}

fn set_property(object: &Value, name: &str, value: Value) -> Result<(), ScriptError> {
    match object {
        Value::Undefined | Value::Null => Err(ScriptError::Type(format!(
            "Cannot set properties of {object} (setting '{name}')"
        ))),
        Value::Object(fields) => {
            fields.borrow_mut().set(name, value);
            Ok(())
        }
        Value::Array(items) if name == "length" => match value.as_index() {
            Some(len) if len <= MAX_ARRAY_LENGTH => {
                items.borrow_mut().resize(len, Value::Undefined);
                Ok(())
            }
            _ => Err(ScriptError::Range("Invalid array length".to_string())),
        },
        _ => Ok(()),
    }
}

fn set_index(object: &Value, index: &Value, value: Value) -> Result<(), ScriptError> {
    match (object, index.as_index()) {
        (Value::Array(items), Some(i)) => {
            if i >= MAX_ARRAY_LENGTH {
                return Err(ScriptError::Range("Invalid array length".to_string()));
            }
            let mut items = items.borrow_mut();
            if i >= items.len() {
                items.resize(i + 1, Value::Undefined);
            }
            items[i] = value;
            Ok(())
        }
        _ => set_property(object, &index.to_js_string(), value),
    }
}
